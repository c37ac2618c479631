use crate::config::toml_config::GrantsConfig;
use crate::core::catalog::{load_programs, GrantCatalog};
use crate::core::index::{average_distance, FlatIndex};
use crate::core::scoring::{match_score, MatchBand};
use crate::core::strategy::{decide_strategy, SearchStrategy, NO_RESULTS_DISTANCE, RELEVANCE_DISTANCE};
use crate::domain::model::{
    ChatMessage, ChatRequest, ChatRole, ExperienceLevel, FarmerProfile, GrantProgram, WebResult,
    PLACEHOLDER,
};
use crate::domain::ports::{ChatProvider, EmbeddingProvider, Storage, WebSearchProvider};
use crate::utils::error::{AdvisorError, Result};
use serde::Serialize;
use std::sync::Arc;

const LARGE_FARM_ACRES: u32 = 500;
const ANSWER_TEMPERATURE: f32 = 0.6;
const ANSWER_MAX_TOKENS: u32 = 1200;

/// 一筆本地搜尋命中的補助計畫
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantMatch {
    pub program: GrantProgram,
    pub distance: f32,
    pub confidence: f32,
    pub match_score: u32,
}

impl GrantMatch {
    pub fn band(&self) -> MatchBand {
        MatchBand::for_score(self.match_score)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocalSearch {
    pub matches: Vec<GrantMatch>,
    /// Mean over every returned neighbour, not only the kept ones.
    pub average_distance: f32,
}

impl LocalSearch {
    fn empty() -> Self {
        Self {
            matches: Vec::new(),
            average_distance: NO_RESULTS_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantAnswer {
    pub answer: String,
    pub strategy: SearchStrategy,
    pub local_matches: Vec<GrantMatch>,
    pub web_results: Vec<WebResult>,
}

/// Chat-style grant finder over the static catalog, with optional web blending.
pub struct GrantFinder {
    catalog: GrantCatalog,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    web: Arc<dyn WebSearchProvider>,
    settings: GrantsConfig,
}

impl GrantFinder {
    pub fn new(
        catalog: GrantCatalog,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
        web: Arc<dyn WebSearchProvider>,
        settings: GrantsConfig,
    ) -> Self {
        Self {
            catalog,
            embedder,
            chat,
            web,
            settings,
        }
    }

    /// embed → nearest neighbours → relevance filter → score → sort by score
    pub async fn search_local(
        &self,
        query: &str,
        profile: Option<&FarmerProfile>,
        top_k: usize,
    ) -> Result<LocalSearch> {
        if self.catalog.is_empty() {
            return Ok(LocalSearch::empty());
        }

        let vector = self.embedder.embed(query).await?;
        let neighbors = self.catalog.index().search(&vector, top_k)?;
        let avg = average_distance(&neighbors);

        let mut matches: Vec<GrantMatch> = neighbors
            .iter()
            .filter(|n| n.distance < RELEVANCE_DISTANCE)
            .filter_map(|n| {
                let program = self.catalog.program(n.row)?;
                Some(GrantMatch {
                    program: program.clone(),
                    distance: n.distance,
                    confidence: 1.0 / (1.0 + n.distance),
                    match_score: match_score(program, profile),
                })
            })
            .collect();
        // stable sort keeps distance order among equal scores
        matches.sort_by(|a, b| b.match_score.cmp(&a.match_score));

        tracing::debug!(
            "Local search kept {}/{} neighbours (avg distance {:.3})",
            matches.len(),
            neighbors.len(),
            avg
        );
        Ok(LocalSearch {
            matches,
            average_distance: avg,
        })
    }

    pub async fn ask(
        &self,
        query: &str,
        profile: Option<&FarmerProfile>,
        history: &[ChatMessage],
    ) -> Result<GrantAnswer> {
        tracing::info!("🔍 Grant question: {}", query);

        let local = match self.search_local(query, profile, self.settings.top_k).await {
            Ok(local) => local,
            Err(e) => {
                tracing::warn!("⚠️ Local grant search failed: {}", e);
                LocalSearch::empty()
            }
        };

        let strategy = decide_strategy(query, local.average_distance);
        tracing::info!("🧭 Search strategy: {}", strategy);

        let web_results = if strategy.uses_web() {
            let web_query = format!("USDA grants {}", query);
            match self.web.search(&web_query, self.settings.web_results).await {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!("⚠️ Web search failed, answering without it: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let system = system_prompt(
            strategy,
            self.catalog.len(),
            profile,
            &local.matches,
            &web_results,
        );
        let mut messages = vec![ChatMessage::system(system)];
        let skip = history.len().saturating_sub(self.settings.history_turns);
        messages.extend(
            history
                .iter()
                .skip(skip)
                .filter(|m| m.role != ChatRole::System)
                .cloned(),
        );
        messages.push(ChatMessage::user(query));

        let answer = self
            .chat
            .complete(ChatRequest {
                messages,
                temperature: Some(ANSWER_TEMPERATURE),
                max_tokens: Some(ANSWER_MAX_TOKENS),
                json_mode: false,
            })
            .await?;

        Ok(GrantAnswer {
            answer,
            strategy,
            local_matches: local.matches,
            web_results,
        })
    }

    /// Wizard grant step: search with a query derived from the profile and crops.
    pub async fn find_for_profile(
        &self,
        profile: &FarmerProfile,
        crops: &[String],
    ) -> Result<Vec<GrantMatch>> {
        let query = profile_query(profile, crops);
        tracing::info!("🔍 Searching grants for profile: {}", query);
        let top_k = self.settings.top_k.min(self.catalog.len());
        let local = self.search_local(&query, Some(profile), top_k).await?;
        Ok(local.matches)
    }
}

pub fn profile_query(profile: &FarmerProfile, crops: &[String]) -> String {
    let mut parts: Vec<String> = Vec::new();

    if profile.is_beginning() {
        parts.push("beginning farmer new rancher startup loans".to_string());
    }
    if profile.farm_size_acres < crate::core::scoring::SMALL_FARM_ACRES {
        parts.push("small farm microloans".to_string());
    } else if profile.farm_size_acres > LARGE_FARM_ACRES {
        parts.push("large scale commercial operations".to_string());
    }
    if !crops.is_empty() {
        let named: Vec<&str> = crops.iter().take(2).map(String::as_str).collect();
        parts.push(format!("{} specialty crops", named.join(" ")));
    }
    parts.push("operating loans grants subsidies".to_string());

    parts.join(" ")
}

/// Fixed recommendations shown when the grant search itself fails.
pub fn fallback_recommendations(profile: &FarmerProfile) -> Vec<GrantMatch> {
    let mut matches = Vec::new();

    if profile.experience == ExperienceLevel::Beginner {
        matches.push(fallback_match(
            "fsa-beginning-farmers",
            "Beginning Farmers and Ranchers Loans",
            "Ownership: up to $600K; Operating: up to $400K",
            "Less than 10 years farming experience",
            "Continuous; funds reserved until April 1 annually",
            "https://www.fsa.usda.gov/programs-and-services/beginning-farmers-and-ranchers",
            90,
        ));
    }
    matches.push(fallback_match(
        "fsa-operating-loans",
        "Farm Operating Loans",
        "Direct: up to $400,000; Guaranteed: up to $2,251,000",
        "Family farmers or ranchers",
        "Year-round; processing 30-60 days",
        "https://www.fsa.usda.gov/programs-and-services/farm-loan-programs/farm-operating-loans",
        80,
    ));

    matches
}

fn fallback_match(
    id: &str,
    name: &str,
    amount: &str,
    eligibility: &str,
    deadline: &str,
    url: &str,
    score: u32,
) -> GrantMatch {
    GrantMatch {
        program: GrantProgram {
            program_id: id.to_string(),
            program_name: name.to_string(),
            agency: "USDA Farm Service Agency (FSA)".to_string(),
            program_type: "Loan".to_string(),
            summary: String::new(),
            eligibility: vec![eligibility.to_string()],
            funding_amount: amount.to_string(),
            application_deadlines: deadline.to_string(),
            application_method: PLACEHOLDER.to_string(),
            required_documents: Vec::new(),
            contact_info: PLACEHOLDER.to_string(),
            official_url: url.to_string(),
            year_round_application: false,
        },
        distance: NO_RESULTS_DISTANCE,
        confidence: 0.0,
        match_score: score,
    }
}

fn profile_context(profile: Option<&FarmerProfile>) -> String {
    let Some(p) = profile else {
        return String::new();
    };
    format!(
        "**Farmer Profile:**\n\
         - Beginning Farmer: {}\n\
         - Veteran: {}\n\
         - State: {}\n\n\
         Use this profile to personalize your recommendations and highlight programs that are especially good matches.\n",
        p.is_beginning(),
        p.veteran,
        p.state.as_deref().unwrap_or("Not specified")
    )
}

fn local_context(matches: &[GrantMatch]) -> String {
    matches
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let p = &m.program;
            format!(
                "Local Program {}: {}\n\
                 - Match Score: {}/100\n\
                 - Match Confidence: {:.2}\n\
                 - Type: {}\n\
                 - Agency: {}\n\
                 - Eligibility: {}\n\
                 - Funding: {}\n\
                 - Application Method: {}\n\
                 - Deadlines: {}\n\
                 - URL: {}\n",
                i + 1,
                p.program_name,
                m.match_score,
                m.confidence,
                p.program_type,
                p.agency,
                p.eligibility.join(", "),
                p.funding_amount,
                p.application_method,
                p.application_deadlines,
                p.official_url
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn web_context(results: &[WebResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "Web Result {}: {}\n- Snippet: {}\n- Source: {}\n",
                i + 1,
                r.title,
                r.snippet,
                r.link
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

pub(crate) fn system_prompt(
    strategy: SearchStrategy,
    catalog_size: usize,
    profile: Option<&FarmerProfile>,
    matches: &[GrantMatch],
    web: &[WebResult],
) -> String {
    let farmer = profile_context(profile);
    match strategy {
        SearchStrategy::WebOnly => format!(
            "You are a USDA grants expert assistant.\n\n{farmer}\n\
             I searched my local database of {catalog_size} USDA programs, but couldn't find relevant matches.\n\n\
             However, I found current information from the web:\n\n\
             **Web Search Results:**\n{web}\n\n\
             **Instructions:**\n\
             - Answer based on the web results\n\
             - Cite sources with clickable links in markdown format: [Source Name](URL)\n\
             - Be clear that this info is from web search\n\
             - If web results don't fully answer the question, say so\n\
             - Suggest checking official USDA websites for complete details\n\
             - Be conversational and helpful",
            web = web_context(web),
        ),
        SearchStrategy::LocalOnly => format!(
            "You are a USDA grants expert with a database of {catalog_size} programs.\n\n{farmer}\n\
             **Local Database Programs (sorted by match score):**\n{local}\n\n\
             **Instructions:**\n\
             - Answer based on your local database\n\
             - Prioritize programs with higher match scores\n\
             - Be specific about which programs match the user's needs\n\
             - Include eligibility criteria and application details\n\
             - Provide official URLs from the programs\n\
             - Be conversational and helpful\n\
             - If asked about programs not in the database, say so clearly",
            local = local_context(matches),
        ),
        SearchStrategy::Hybrid => format!(
            "You are a USDA grants expert with both a local database AND web search capabilities.\n\n{farmer}\n\
             **Local Database Results (sorted by match score):**\n{local}\n\n\
             **Web Search Results:**\n{web}\n\n\
             **Instructions:**\n\
             - Combine information from both sources for a comprehensive answer\n\
             - Prioritize local programs with higher match scores\n\
             - Use local database for structured program details (eligibility, funding, deadlines)\n\
             - Use web results for updates, recent changes, or additional context\n\
             - Clearly distinguish between local database info and web sources\n\
             - Cite web sources with links: [Source](URL)\n\
             - Provide actionable next steps\n\
             - Be conversational and helpful",
            local = local_context(matches),
            web = web_context(web),
        ),
    }
}

/// Offline step: embeds every catalog record and writes the index file.
pub async fn build_index<S: Storage>(
    storage: &S,
    embedder: &dyn EmbeddingProvider,
    catalog_path: &str,
    index_path: &str,
    model: &str,
) -> Result<FlatIndex> {
    let programs = load_programs(storage, catalog_path).await?;
    if programs.is_empty() {
        return Err(AdvisorError::IndexError {
            message: format!("catalog '{}' contains no programs", catalog_path),
        });
    }

    let mut vectors = Vec::with_capacity(programs.len());
    for (i, program) in programs.iter().enumerate() {
        tracing::info!("🧮 Embedding {}/{}: {}", i + 1, programs.len(), program.program_name);
        vectors.push(embedder.embed(&program.embedding_text()).await?);
    }

    let dimension = vectors.first().map(Vec::len).unwrap_or_default();
    let index = FlatIndex::new(dimension, vectors)?.with_model(model);
    storage.write_file(index_path, &index.to_json()?).await?;

    tracing::info!(
        "✅ Wrote {}-row index ({} dimensions) to {}",
        index.len(),
        index.dimension(),
        index_path
    );
    Ok(index)
}
