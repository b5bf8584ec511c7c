use crate::output::{print_json, print_table, truncate};
use readiness_core::config::Config;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root)?;
    let catalog = config.load_catalog(root)?;
    let bands = config.bands(&catalog)?;

    if json {
        let sections: Vec<serde_json::Value> = catalog
            .sections()
            .iter()
            .map(|s| {
                serde_json::json!({
                    "id": s.id,
                    "name": s.name,
                    "description": s.description,
                    "questions": catalog.section_questions(s),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "sections": sections,
            "total_questions": catalog.len(),
            "bands": bands.bands(),
        }));
    }

    let rows: Vec<Vec<String>> = catalog
        .questions()
        .iter()
        .map(|q| {
            vec![
                q.section_id.clone(),
                q.id.clone(),
                truncate(&q.prompt, 70),
            ]
        })
        .collect();
    print_table(&["SECTION", "QUESTION", "PROMPT"], rows);

    println!("\n{} questions, totals {}-{}", catalog.len(), bands.min(), bands.max());
    for band in bands.bands() {
        println!("  {:<20} {}-{}", band.level.label(), band.lower, band.upper - 1);
    }
    Ok(())
}
