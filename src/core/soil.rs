use crate::domain::model::{SoilTexture, SoilType};

/// Rough USDA texture-triangle classification.
pub fn classify_texture(texture: Option<&SoilTexture>) -> SoilType {
    let Some(t) = texture else {
        return SoilType::Unknown;
    };

    if t.clay >= 40.0 {
        SoilType::Clay
    } else if t.sand >= 50.0 {
        if t.clay >= 20.0 {
            SoilType::SandyClay
        } else if t.silt > 0.0 {
            SoilType::SandyLoam
        } else {
            SoilType::Sand
        }
    } else if t.silt >= 50.0 {
        if t.clay >= 27.0 {
            SoilType::SiltyClay
        } else {
            SoilType::SiltLoam
        }
    } else {
        SoilType::Loam
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(clay: f64, silt: f64, sand: f64) -> SoilTexture {
        SoilTexture { clay, silt, sand }
    }

    #[test]
    fn classifies_triangle_regions() {
        assert_eq!(classify_texture(Some(&texture(45.0, 30.0, 25.0))), SoilType::Clay);
        assert_eq!(classify_texture(Some(&texture(25.0, 10.0, 65.0))), SoilType::SandyClay);
        assert_eq!(classify_texture(Some(&texture(10.0, 20.0, 70.0))), SoilType::SandyLoam);
        assert_eq!(classify_texture(Some(&texture(15.0, 0.0, 85.0))), SoilType::Sand);
        assert_eq!(classify_texture(Some(&texture(30.0, 55.0, 15.0))), SoilType::SiltyClay);
        assert_eq!(classify_texture(Some(&texture(15.0, 60.0, 25.0))), SoilType::SiltLoam);
        assert_eq!(classify_texture(Some(&texture(20.0, 40.0, 40.0))), SoilType::Loam);
    }

    #[test]
    fn missing_texture_is_unknown() {
        assert_eq!(classify_texture(None), SoilType::Unknown);
    }
}
