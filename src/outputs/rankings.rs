//! Per-country ranking summaries.
//!
//! Input is `all_games_by_country.json` (`country -> games in ranking
//! order`). From it this module derives:
//!
//! - `games_simplified.json`: name and image of every ranked game
//! - `games_names_only.json`: just the names
//! - the set of distinct rankings and the countries sharing each one
//! - a CSV matrix of each game's position per country
//!
//! Countries are handled in country-code order throughout.

use crate::models::{RankedGame, SimplifiedGame};
use crate::outputs::json::{read, write_pretty};
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub type Rankings = BTreeMap<String, Vec<RankedGame>>;

/// A ranking shared verbatim by one or more countries.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingGroup {
    pub games: Vec<String>,
    pub countries: Vec<String>,
}

pub fn simplify(rankings: &Rankings) -> BTreeMap<String, Vec<SimplifiedGame>> {
    rankings
        .iter()
        .map(|(country, games)| {
            let simplified = games
                .iter()
                .map(|game| SimplifiedGame {
                    name: game.name.clone().unwrap_or_default(),
                    image_url: game.image_url.clone().unwrap_or_default(),
                })
                .collect();
            (country.clone(), simplified)
        })
        .collect()
}

pub fn names_only(rankings: &Rankings) -> BTreeMap<String, Vec<String>> {
    rankings
        .iter()
        .map(|(country, games)| {
            let names = games.iter().map(|game| game.name.clone().unwrap_or_default()).collect();
            (country.clone(), names)
        })
        .collect()
}

/// Group countries whose name lists are identical, in first-seen order.
pub fn unique_rankings(names: &BTreeMap<String, Vec<String>>) -> Vec<RankingGroup> {
    let mut groups: Vec<RankingGroup> = Vec::new();
    for (country, games) in names {
        match groups.iter_mut().find(|group| &group.games == games) {
            Some(group) => group.countries.push(country.clone()),
            None => groups.push(RankingGroup {
                games: games.clone(),
                countries: vec![country.clone()],
            }),
        }
    }
    groups
}

/// Write the simplified and names-only files into `output_dir` and log the
/// distinct rankings.
///
/// # Arguments
///
/// * `input` - `all_games_by_country.json` as written by `parse-best`
/// * `output_dir` - Receives `games_simplified.json` and `games_names_only.json`
///
/// # Returns
///
/// The distinct rankings with the countries sharing each one.
#[instrument(level = "info", skip_all, fields(input = %input.display()))]
pub async fn summarize(input: &Path, output_dir: &Path) -> Result<Vec<RankingGroup>, Box<dyn Error>> {
    let rankings: Rankings = read(input).await?;

    write_pretty(&output_dir.join("games_simplified.json"), &simplify(&rankings)).await?;
    let names = names_only(&rankings);
    write_pretty(&output_dir.join("games_names_only.json"), &names).await?;

    let groups = unique_rankings(&names);
    info!(count = groups.len(), "Number of unique rankings");
    for (index, group) in groups.iter().enumerate() {
        info!(
            ranking = index + 1,
            countries = group.countries.len(),
            found_in = %group.countries.iter().join(", "),
            sample = %group.games.iter().take(5).join(", "),
            "Unique ranking"
        );
    }
    Ok(groups)
}

/// Position matrix: rows are games in first-seen order, columns countries.
#[derive(Debug, Default, PartialEq)]
pub struct RankingMatrix {
    pub countries: Vec<String>,
    pub rows: Vec<(String, HashMap<String, usize>)>,
}

impl RankingMatrix {
    /// Build the matrix; positions are 1-based and count unnamed entries.
    pub fn build(rankings: &Rankings) -> Self {
        let mut matrix = RankingMatrix::default();
        let mut row_of: HashMap<String, usize> = HashMap::new();

        for (country, games) in rankings {
            let mut seen_named = false;
            for (position, game) in games.iter().enumerate() {
                let Some(name) = game.name.as_deref().filter(|n| !n.is_empty()) else {
                    continue;
                };
                seen_named = true;
                let row = *row_of.entry(name.to_string()).or_insert_with(|| {
                    matrix.rows.push((name.to_string(), HashMap::new()));
                    matrix.rows.len() - 1
                });
                matrix.rows[row].1.insert(country.clone(), position + 1);
            }
            if seen_named {
                matrix.countries.push(country.clone());
            }
        }
        matrix
    }

    /// Write the matrix as CSV with a `Game Name` column first.
    pub fn write_csv(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["Game Name".to_string()];
        header.extend(self.countries.iter().cloned());
        writer.write_record(&header)?;

        for (name, positions) in &self.rows {
            let mut record = vec![name.clone()];
            record.extend(
                self.countries
                    .iter()
                    .map(|country| positions.get(country).map(|p| p.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Default CSV location: `<input stem>_rankings.csv` next to the input.
pub fn default_csv_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("rankings");
    input.with_file_name(format!("{stem}_rankings.csv"))
}

/// Read the rankings file and write its position matrix as CSV.
#[instrument(level = "info", skip_all, fields(input = %input.display(), output = %output.display()))]
pub async fn export_csv(input: &Path, output: &Path) -> Result<RankingMatrix, Box<dyn Error>> {
    let rankings: Rankings = read(input).await?;
    let matrix = RankingMatrix::build(&rankings);
    matrix.write_csv(output)?;
    info!(games = matrix.rows.len(), countries = matrix.countries.len(), "Ranking CSV written");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(name: &str) -> RankedGame {
        RankedGame {
            name: Some(name.to_string()),
            image_url: Some(format!("/img/{name}.jpg")),
            ..Default::default()
        }
    }

    fn sample() -> Rankings {
        let mut rankings = Rankings::new();
        rankings.insert("CA".to_string(), vec![game("A"), game("B"), game("C")]);
        rankings.insert("DE".to_string(), vec![game("B"), RankedGame::default(), game("D")]);
        rankings.insert("US".to_string(), vec![game("A"), game("B"), game("C")]);
        rankings.insert("ZZ".to_string(), vec![RankedGame::default()]);
        rankings
    }

    #[test]
    fn test_simplify_fills_missing_fields() {
        let simplified = simplify(&sample());
        assert_eq!(simplified["DE"][1], SimplifiedGame { name: String::new(), image_url: String::new() });
        assert_eq!(simplified["CA"][0].image_url, "/img/A.jpg");
    }

    #[test]
    fn test_unique_rankings_groups_identical_lists() {
        let groups = unique_rankings(&names_only(&sample()));
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].countries, vec!["CA", "US"]);
        assert_eq!(groups[0].games, vec!["A", "B", "C"]);
        assert_eq!(groups[1].countries, vec!["DE"]);
        assert_eq!(groups[2].countries, vec!["ZZ"]);
    }

    #[test]
    fn test_matrix_positions() {
        let matrix = RankingMatrix::build(&sample());
        assert_eq!(matrix.countries, vec!["CA", "DE", "US"]);
        let names: Vec<&str> = matrix.rows.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);

        let d = &matrix.rows[3].1;
        // the unnamed entry still occupies position 2
        assert_eq!(d.get("DE"), Some(&3));
        assert_eq!(d.get("CA"), None);
        assert_eq!(matrix.rows[1].1.get("DE"), Some(&1));
    }

    #[tokio::test]
    async fn test_export_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("all_games_by_country.json");
        write_pretty(&input, &sample()).await.unwrap();
        let output = default_csv_path(&input);
        assert_eq!(output, dir.path().join("all_games_by_country_rankings.csv"));

        export_csv(&input, &output).await.unwrap();

        let csv = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Game Name,CA,DE,US");
        assert_eq!(lines[1], "A,1,,1");
        assert_eq!(lines[2], "B,2,1,2");
        assert_eq!(lines[4], "D,,3,");
    }

    #[tokio::test]
    async fn test_summarize_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("all_games_by_country.json");
        write_pretty(&input, &sample()).await.unwrap();

        let groups = summarize(&input, dir.path()).await.unwrap();

        assert_eq!(groups.len(), 3);
        let names: BTreeMap<String, Vec<String>> =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("games_names_only.json")).unwrap()).unwrap();
        assert_eq!(names["US"], vec!["A", "B", "C"]);
        assert!(dir.path().join("games_simplified.json").exists());
    }
}
