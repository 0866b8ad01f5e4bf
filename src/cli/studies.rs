//! Studies command - browse the compendium

use super::require_compendium;
use crate::compendium::{
    study_summaries, Algorithm, Axiom, Category, Compendium, CompendiumError, SequencePair, Study,
};
use crate::config::UserConfig;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use console::style;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum StudiesCommand {
    /// List studies, optionally filtered by category
    List {
        /// Category: classical, film, comics, literature, interactive, animation
        #[arg(long, short = 'c')]
        category: Option<String>,
    },

    /// Show one study's axioms and algorithms
    Show {
        /// Study ID (e.g. pixar)
        id: String,
    },

    /// List a study's diagnostic questions
    Questions {
        /// Study ID (e.g. pixar)
        id: String,
    },

    /// Search axioms (or algorithms) across all studies
    Search {
        /// Case-insensitive search text
        query: String,

        /// Search algorithms instead of axioms
        #[arg(long)]
        algorithms: bool,

        /// Maximum results to print
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Show one algorithm's steps
    Algorithm {
        /// `<study>.<algorithm name>` (e.g. "pixar.Story Spine")
        reference: String,
    },

    /// Show one axiom
    Axiom {
        /// `<study>.<axiom id>` (e.g. pixar.PX-1)
        reference: String,
    },

    /// List sequence pairs: studies that illuminate each other
    Pairs,
}

pub fn run(command: StudiesCommand, compendium: Option<&Path>, config: &UserConfig) -> Result<()> {
    let compendium = require_compendium(compendium, config)?;
    match command {
        StudiesCommand::List { category } => list(&compendium, category.as_deref()),
        StudiesCommand::Show { id } => {
            show(find_study(&compendium, &id)?);
            Ok(())
        }
        StudiesCommand::Questions { id } => {
            questions(find_study(&compendium, &id)?);
            Ok(())
        }
        StudiesCommand::Search {
            query,
            algorithms,
            limit,
        } => {
            search(&compendium, &query, algorithms, limit);
            Ok(())
        }
        StudiesCommand::Algorithm { reference } => {
            let (study, algorithm) = find_algorithm(&compendium, &reference)?;
            show_algorithm(study, algorithm);
            Ok(())
        }
        StudiesCommand::Axiom { reference } => {
            let (study, axiom) = find_axiom(&compendium, &reference)?;
            println!(
                "\n{} {} [{}]",
                style(&axiom.id).cyan().bold(),
                style(&axiom.name).bold(),
                study.id
            );
            if !axiom.statement.is_empty() {
                println!("  {}", axiom.statement);
            }
            Ok(())
        }
        StudiesCommand::Pairs => {
            pairs(compendium.get_sequence_pairs());
            Ok(())
        }
    }
}

/// Split `study.item` at the first dot
fn split_reference(reference: &str) -> Result<(&str, &str)> {
    match reference.split_once('.') {
        Some((study, item)) if !study.is_empty() && !item.is_empty() => Ok((study, item)),
        _ => Err(anyhow!(
            "Expected <study>.<name>, got '{reference}' (e.g. pixar.PX-1)"
        )),
    }
}

fn find_algorithm<'a>(compendium: &'a Compendium, reference: &str) -> Result<(&'a Study, &'a Algorithm)> {
    let (study_id, name) = split_reference(reference)?;
    let study = find_study(compendium, study_id)?;
    let algorithm = study.get_algorithm(name).ok_or_else(|| {
        let available: Vec<&str> = study.core_algorithms.iter().map(|a| a.name.as_str()).collect();
        anyhow!(
            "Algorithm '{name}' not found in {study_id}. Available: {}",
            available.join(", ")
        )
    })?;
    Ok((study, algorithm))
}

fn find_axiom<'a>(compendium: &'a Compendium, reference: &str) -> Result<(&'a Study, &'a Axiom)> {
    let (study_id, axiom_id) = split_reference(reference)?;
    let study = find_study(compendium, study_id)?;
    let axiom = study.get_axiom(axiom_id).ok_or_else(|| {
        let available: Vec<&str> = study.axioms.iter().map(|a| a.id.as_str()).collect();
        anyhow!(
            "Axiom '{axiom_id}' not found in {study_id}. Available: {}",
            available.join(", ")
        )
    })?;
    Ok((study, axiom))
}

/// Look up a study, listing the available IDs when it is missing
pub(super) fn find_study<'a>(compendium: &'a Compendium, id: &str) -> Result<&'a Study> {
    compendium.get_study(id).ok_or_else(|| {
        CompendiumError::StudyNotFound {
            id: id.to_string(),
            available: compendium.list_study_ids().join(", "),
        }
        .into()
    })
}

fn list(compendium: &Compendium, category: Option<&str>) -> Result<()> {
    let category: Option<Category> = category
        .map(str::parse)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let summaries: Vec<_> = study_summaries(compendium)
        .into_iter()
        .filter(|s| category.map_or(true, |c| s.category == c.as_str()))
        .collect();

    println!(
        "\n{} ({} of {})\n",
        style("Studies").bold(),
        summaries.len(),
        compendium.studies.len()
    );
    for s in &summaries {
        println!(
            "  {:<16} {:<28} {:<36} {}",
            style(&s.id).cyan(),
            s.creator,
            s.work,
            style(format!(
                "{} axioms, {} algorithms, {} questions",
                s.axiom_count, s.algorithm_count, s.question_count
            ))
            .dim()
        );
    }
    if summaries.is_empty() {
        println!("  {}", style("No studies match.").dim());
    }
    Ok(())
}

fn show(study: &Study) {
    println!(
        "\n{} {} - {} [{}]",
        style(&study.id).cyan().bold(),
        study.creator,
        study.work,
        study.category
    );

    if !study.axioms.is_empty() {
        println!("\n{}", style("Axioms").bold());
        for axiom in &study.axioms {
            println!("  {} {}", style(&axiom.id).cyan(), style(&axiom.name).bold());
            if !axiom.statement.is_empty() {
                println!("    {}", axiom.statement);
            }
        }
    }

    if !study.core_algorithms.is_empty() {
        println!("\n{}", style("Algorithms").bold());
        for algorithm in &study.core_algorithms {
            println!("  {}", style(&algorithm.name).bold());
            if !algorithm.description.is_empty() {
                println!("    {}", style(&algorithm.description).dim());
            }
            for (i, step) in algorithm.steps.iter().enumerate() {
                println!("    {}. {}", i + 1, step);
            }
        }
    }

    println!(
        "\n{} diagnostic questions (see `narratological studies questions {}`)",
        study.diagnostic_questions.len(),
        study.id
    );
}

fn questions(study: &Study) {
    println!(
        "\n{} {} diagnostic questions\n",
        style(&study.id).cyan().bold(),
        study.diagnostic_questions.len()
    );
    for q in &study.diagnostic_questions {
        println!("  {} {}", style(&q.id).cyan(), q.question);
        if !q.valid_if.is_empty() {
            println!("    {}", style(format!("Valid if: {}", q.valid_if)).dim());
        }
    }
}

fn show_algorithm(study: &Study, algorithm: &Algorithm) {
    println!(
        "\n{} [{}]",
        style(&algorithm.name).cyan().bold(),
        study.id
    );
    if !algorithm.description.is_empty() {
        println!("  {}", style(&algorithm.description).dim());
    }
    for (i, step) in algorithm.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }
}

fn pairs(pairs: &[SequencePair]) {
    println!("\n{} ({})\n", style("Sequence pairs").bold(), pairs.len());
    if pairs.is_empty() {
        println!("  {}", style("No sequence pairs in this compendium.").dim());
    }
    for pair in pairs {
        println!(
            "  {} {} ({})",
            style(&pair.id).cyan(),
            style(&pair.name).bold(),
            pair.studies.join(" + ")
        );
        for principle in &pair.shared_principles {
            println!("    shared: {principle}");
        }
        for contrast in &pair.contrasts {
            println!("    {}", style(format!("contrast: {contrast}")).dim());
        }
    }
}

fn search(compendium: &Compendium, query: &str, algorithms: bool, limit: usize) {
    let hits: Vec<(String, String, String)> = if algorithms {
        compendium
            .search_algorithms(query)
            .into_iter()
            .map(|(study, a)| (study.to_string(), a.name.clone(), a.description.clone()))
            .collect()
    } else {
        compendium
            .search_axioms(query)
            .into_iter()
            .map(|(study, a)| (study.to_string(), format!("{} {}", a.id, a.name), a.statement.clone()))
            .collect()
    };

    let kind = if algorithms { "algorithms" } else { "axioms" };
    println!("\n{} {} {} matching '{}'\n", style("Found").bold(), hits.len(), kind, query);
    for (study, name, detail) in hits.iter().take(limit) {
        println!("  [{}] {}", style(study).cyan(), style(name).bold());
        if !detail.is_empty() {
            println!("    {}", style(detail).dim());
        }
    }
    if hits.len() > limit {
        println!("  {}", style(format!("...and {} more", hits.len() - limit)).dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compendium::tests::sample_compendium;

    #[test]
    fn test_find_study_lists_available_ids() {
        let compendium = sample_compendium();
        assert_eq!(find_study(&compendium, "pixar").unwrap().id, "pixar");

        let err = find_study(&compendium, "kubrick").unwrap_err().to_string();
        assert!(err.contains("kubrick"));
        assert!(err.contains("pixar"));
    }

    #[test]
    fn test_list_rejects_unknown_category() {
        assert!(list(&sample_compendium(), Some("opera")).is_err());
        assert!(list(&sample_compendium(), Some("film")).is_ok());
    }

    #[test]
    fn test_find_algorithm_ignores_case() {
        let compendium = sample_compendium();
        let (study, algorithm) = find_algorithm(&compendium, "pixar.story spine").unwrap();
        assert_eq!(study.id, "pixar");
        assert_eq!(algorithm.name, "Story Spine");

        let err = find_algorithm(&compendium, "pixar.Hero Cycle").unwrap_err().to_string();
        assert!(err.contains("Story Spine"));
        assert!(find_algorithm(&compendium, "kubrick.Story Spine").is_err());
    }

    #[test]
    fn test_find_axiom_by_id() {
        let compendium = sample_compendium();
        let (_, axiom) = find_axiom(&compendium, "bergman.IB-1").unwrap();
        assert_eq!(axiom.name, "The Face");

        let err = find_axiom(&compendium, "bergman.IB-9").unwrap_err().to_string();
        assert!(err.contains("IB-1"));
    }

    #[test]
    fn test_reference_needs_study_and_name() {
        assert_eq!(split_reference("pixar.PX-1").unwrap(), ("pixar", "PX-1"));
        assert_eq!(split_reference("a.b.c").unwrap(), ("a", "b.c"));
        assert!(split_reference("pixar").is_err());
        assert!(split_reference(".PX-1").is_err());
        assert!(split_reference("pixar.").is_err());
    }

    #[test]
    fn test_sequence_pairs_are_read_from_compendium() {
        let mut compendium = sample_compendium();
        assert!(compendium.get_sequence_pairs().is_empty());
        compendium.sequence_pairs.push(SequencePair {
            id: "SP-1".into(),
            name: "Cause and Face".into(),
            studies: vec!["pixar".into(), "bergman".into()],
            shared_principles: vec!["Scenes earn their place".into()],
            contrasts: vec![],
        });
        assert_eq!(compendium.get_sequence_pairs()[0].studies, vec!["pixar", "bergman"]);
        pairs(compendium.get_sequence_pairs());
    }
}
