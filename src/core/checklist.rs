use crate::domain::model::GrantProgram;

pub fn application_checklist(program: &GrantProgram) -> String {
    let mut out = format!(
        "## Application Checklist for {}\n\n",
        program.program_name
    );

    out.push_str("### ✅ Before You Start\n");
    out.push_str(&format!(
        "- [ ] Read full program details at: {}\n",
        program.official_url
    ));
    out.push_str(&format!(
        "- [ ] Check deadline: {}\n",
        program.application_deadlines
    ));
    out.push_str("- [ ] Confirm you meet eligibility requirements\n\n");

    out.push_str("### 📋 Required Documents\n");
    if program.required_documents.is_empty() {
        out.push_str("- [ ] Ask your local office which documents apply\n");
    }
    for doc in &program.required_documents {
        out.push_str(&format!("- [ ] {}\n", doc));
    }
    out.push('\n');

    out.push_str("### 📞 Contact Information\n");
    out.push_str(&format!(
        "If you have questions, contact: {}\n\n",
        program.contact_info
    ));

    out.push_str("### 🚀 Next Steps\n");
    out.push_str("1. Gather all required documents\n");
    out.push_str("2. Contact your local office for guidance\n");
    out.push_str(&format!(
        "3. Submit application via: {}\n\n",
        program.application_method
    ));

    out.push_str("### 💡 Eligibility Requirements\n");
    for req in &program.eligibility {
        out.push_str(&format!("- {}\n", req));
    }

    out
}

/// File name used when a checklist is exported.
pub fn checklist_filename(program: &GrantProgram) -> String {
    let id: String = program
        .program_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let id = if id.is_empty() { "program".to_string() } else { id };
    format!("{}_checklist.md", id)
}
