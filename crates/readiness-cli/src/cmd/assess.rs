use super::open_store;
use crate::output::{print_json, print_table};
use readiness_core::score::{FindingKind, ReadinessResult};
use readiness_core::session::NextQuestion;
use readiness_core::types::BusinessProfile;
use std::path::Path;

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

pub fn start(
    root: &Path,
    name: String,
    industry: String,
    size: String,
    location: String,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let session = store.start(BusinessProfile::new(name, industry, size, location))?;

    if json {
        return print_json(&serde_json::json!({
            "assessment_id": session.id(),
            "business_info": session.profile(),
            "total_questions": store.catalog().len(),
        }));
    }

    println!("Started assessment {}", session.id());
    println!(
        "  {} ({}, {}, {})",
        session.profile().name,
        session.profile().industry,
        session.profile().size,
        session.profile().location
    );
    println!("  {} questions", store.catalog().len());
    println!("\nNext: readiness next {}", session.id());
    Ok(())
}

// ---------------------------------------------------------------------------
// next
// ---------------------------------------------------------------------------

pub fn next(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let next = store.next_question(id)?;

    if json {
        return print_json(&next);
    }

    match next {
        NextQuestion::Complete { total_questions } => {
            println!("All {total_questions} questions answered.");
            println!("Next: readiness results {id}");
        }
        NextQuestion::Question(q) => {
            println!(
                "[{}/{}] Section {} of {}: {} (question {} of {})",
                q.cursor + 1,
                q.total_questions,
                q.section_index + 1,
                q.section_count,
                q.section_name,
                q.position_in_section,
                q.section_question_count
            );
            println!();
            if let Some(description) = &q.description {
                println!("{description}");
            }
            println!("{}", q.prompt);
            println!();
            for (score, text) in &q.rubric {
                println!("  {score}  {text}");
            }
            println!("\nAnswer: readiness answer {id} {} <1-5>", q.question_id);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// answer
// ---------------------------------------------------------------------------

pub fn answer(root: &Path, id: &str, question: &str, score: i64, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let outcome = store.submit_answer(id, question, score)?;

    if json {
        return print_json(&outcome);
    }

    println!(
        "Recorded {} = {} ({}/{})",
        outcome.question_id,
        outcome.score,
        outcome.cursor,
        store.catalog().len()
    );
    if outcome.complete {
        let level = store.readiness_level(id)?;
        println!("Assessment complete. Readiness: {level}");
        println!("Next: readiness results {id}");
    } else {
        println!("Next: readiness next {id}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// status
// ---------------------------------------------------------------------------

pub fn status(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let status = store.status(id)?;

    if json {
        return print_json(&status);
    }

    println!("Assessment: {}", status.assessment_id);
    println!("Business:   {}", status.business_info.name);
    println!(
        "Progress:   {}/{} ({}%)",
        status.cursor, status.total_questions, status.completion_percentage
    );
    match &status.current_section_id {
        Some(section) => println!("Section:    {section}"),
        None => println!("Status:     complete"),
    }
    println!("Started:    {}", status.started_at.format("%Y-%m-%d %H:%M UTC"));
    Ok(())
}

// ---------------------------------------------------------------------------
// results
// ---------------------------------------------------------------------------

pub fn results(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let summary = store.summary(id)?;

    if json {
        return print_json(&summary);
    }

    let rows: Vec<Vec<String>> = summary
        .sections
        .iter()
        .map(|s| {
            vec![
                s.name.clone(),
                format!("{}/{}", s.answered, s.question_count),
                format!("{}/{}", s.subtotal, s.max_points),
                format!("{}%", s.percentage),
                s.performance.to_string(),
            ]
        })
        .collect();
    print_table(&["SECTION", "ANSWERED", "SCORE", "PCT", "PERFORMANCE"], rows);

    println!(
        "\nTotal: {} (range {}-{}), {}% answered",
        summary.total, summary.min_total, summary.max_total, summary.completion_percentage
    );
    match &summary.readiness {
        Some(r) => print_readiness(r),
        None => println!("Readiness: available once every question is answered"),
    }

    if !summary.strengths.is_empty() {
        println!("\nStrengths:");
        for f in &summary.strengths {
            println!("  {} {} ({})", f.question_id, f.description, f.score);
        }
    }
    if !summary.improvement_areas.is_empty() {
        println!("\nImprovement areas:");
        for f in &summary.improvement_areas {
            let tag = match f.kind {
                FindingKind::Critical => "critical",
                _ => "moderate",
            };
            println!("  [{tag}] {} {} ({})", f.question_id, f.description, f.score);
        }
    }
    Ok(())
}

fn print_readiness(r: &ReadinessResult) {
    println!("Readiness: {} (band {}-{})", r.label, r.band.lower, r.band.upper - 1);
    println!("  {}", r.description);
    println!("  Timeline: {}", r.timeline);
}
