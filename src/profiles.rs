//! Synthetic respondent generation
//!
//! Every combination of six categorical attributes becomes one profile. The
//! table is written once and then read back by the persona survey, so row
//! position is the profile's identity.

use crate::error::{Error, Result};
use crate::table::{read_table, write_table};
use crate::types::Profile;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Column names of the profile table, in file order
pub const PROFILE_COLUMNS: [&str; 6] = ["Gender", "Age", "Kids", "Income", "Education", "Politics"];

/// Value sets for every profile attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDomains {
    /// Gender labels
    pub gender: Vec<String>,
    /// Ages in years
    pub age: Vec<u32>,
    /// Number of children
    pub kids: Vec<u32>,
    /// Monthly income brackets in Euros
    pub income: Vec<String>,
    /// Education levels
    pub education: Vec<String>,
    /// Political leanings
    pub politics: Vec<String>,
}

impl Default for ProfileDomains {
    fn default() -> Self {
        Self {
            gender: strings(&["Men", "Woman"]),
            age: vec![18, 35, 50, 65],
            kids: vec![0, 1, 2],
            income: strings(&["less than 1500", "1500-2500", "2500-4000", "more than 4000"]),
            education: strings(&["no high school", "a high school", "a college"]),
            politics: strings(&[
                "left-wing",
                "left-leaning",
                "centre",
                "right-leaning",
                "right-wing",
            ]),
        }
    }
}

impl ProfileDomains {
    /// Reject empty domains, which would make the product empty
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("gender", self.gender.len()),
            ("age", self.age.len()),
            ("kids", self.kids.len()),
            ("income", self.income.len()),
            ("education", self.education.len()),
            ("politics", self.politics.len()),
        ];
        match sizes.iter().find(|(_, len)| *len == 0) {
            Some((name, _)) => Err(Error::invalid_input(format!(
                "profile domain '{}' is empty",
                name
            ))),
            None => Ok(()),
        }
    }

    /// Number of profiles [`generate`](Self::generate) yields
    pub fn combination_count(&self) -> usize {
        self.gender.len()
            * self.age.len()
            * self.kids.len()
            * self.income.len()
            * self.education.len()
            * self.politics.len()
    }

    /// All combinations in lexicographic product order, gender outermost
    pub fn generate(&self) -> Result<Vec<Profile>> {
        self.validate()?;

        let mut profiles = Vec::with_capacity(self.combination_count());
        for gender in &self.gender {
            for &age in &self.age {
                for &kids in &self.kids {
                    for income in &self.income {
                        for education in &self.education {
                            for politics in &self.politics {
                                profiles.push(Profile {
                                    gender: gender.clone(),
                                    age,
                                    kids,
                                    income: income.clone(),
                                    education: education.clone(),
                                    politics: politics.clone(),
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(profiles)
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Write the profile table
pub fn write_profiles(path: &Path, profiles: &[Profile]) -> Result<()> {
    let rows: Vec<Vec<String>> = profiles
        .iter()
        .map(|p| {
            vec![
                p.gender.clone(),
                p.age.to_string(),
                p.kids.to_string(),
                p.income.clone(),
                p.education.clone(),
                p.politics.clone(),
            ]
        })
        .collect();

    write_table(path, &PROFILE_COLUMNS, &rows)?;
    info!(path = %path.display(), profiles = profiles.len(), "wrote profile table");
    Ok(())
}

/// Read the profile table back, in file order
pub fn read_profiles(path: &Path) -> Result<Vec<Profile>> {
    let table = read_table(path)?;
    let columns = table.require_columns(path, &PROFILE_COLUMNS)?;
    let display = path.display().to_string();

    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            // header is line 1
            let line = i + 2;
            let number = |col: usize, name: &str| -> Result<u32> {
                row[col].trim().parse().map_err(|_| {
                    Error::malformed_table(
                        display.clone(),
                        line,
                        format!("{} '{}' is not a whole number", name, row[col]),
                    )
                })
            };

            Ok(Profile {
                gender: row[columns[0]].clone(),
                age: number(columns[1], "Age")?,
                kids: number(columns[2], "Kids")?,
                income: row[columns[3]].clone(),
                education: row[columns[4]].clone(),
                politics: row[columns[5]].clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_domains_count() {
        let domains = ProfileDomains::default();
        assert_eq!(domains.combination_count(), 2 * 4 * 3 * 4 * 3 * 5);
        assert_eq!(domains.generate().unwrap().len(), 1440);
    }

    #[test]
    fn test_count_matches_product_for_custom_domains() {
        let domains = ProfileDomains {
            gender: strings(&["Woman"]),
            age: vec![20, 40],
            kids: vec![0, 1, 2, 3],
            income: strings(&["low", "high"]),
            education: strings(&["a college"]),
            politics: strings(&["centre", "left-wing", "right-wing"]),
        };
        let profiles = domains.generate().unwrap();
        assert_eq!(profiles.len(), 2 * 4 * 2 * 3);
        assert_eq!(profiles.len(), domains.combination_count());
    }

    #[test]
    fn test_generation_order_is_lexicographic() {
        let profiles = ProfileDomains::default().generate().unwrap();

        let first = &profiles[0];
        assert_eq!(first.gender, "Men");
        assert_eq!(first.age, 18);
        assert_eq!(first.kids, 0);
        assert_eq!(first.income, "less than 1500");
        assert_eq!(first.education, "no high school");
        assert_eq!(first.politics, "left-wing");

        // politics varies fastest, then education
        assert_eq!(profiles[1].politics, "left-leaning");
        assert_eq!(profiles[5].education, "a high school");
        assert_eq!(profiles[5].politics, "left-wing");

        let last = profiles.last().unwrap();
        assert_eq!(last.gender, "Woman");
        assert_eq!(last.age, 65);
        assert_eq!(last.politics, "right-wing");
    }

    #[test]
    fn test_empty_domain_is_rejected() {
        let domains = ProfileDomains {
            kids: vec![],
            ..ProfileDomains::default()
        };
        assert_eq!(domains.combination_count(), 0);
        assert!(matches!(domains.generate(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_profiles_survive_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        let profiles = ProfileDomains::default().generate().unwrap();

        write_profiles(&path, &profiles).unwrap();
        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("Gender,Age,Kids,Income,Education,Politics\n"));

        assert_eq!(read_profiles(&path).unwrap(), profiles);
    }

    #[test]
    fn test_bad_age_names_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        std::fs::write(
            &path,
            "Gender,Age,Kids,Income,Education,Politics\nMen,35,1,1500-2500,a college,centre\nMen,old,1,1500-2500,a college,centre\n",
        )
        .unwrap();

        match read_profiles(&path).unwrap_err() {
            Error::MalformedTable { line, reason, .. } => {
                assert_eq!(line, 3);
                assert!(reason.contains("Age"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
