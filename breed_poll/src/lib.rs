/*!
Breed catalog and response log for a dog breed group poll.

The [`Catalog`] is the static reference data (breeds and the group each of them
belongs to). It is built once, through [`builder::CatalogBuilder`], and never
changes afterwards. The [`response_log::ResponseLog`] is an append-only CSV file
holding one row per submission.

```
use breed_poll::builder::CatalogBuilder;
use breed_poll::GroupOrder;
use std::collections::HashMap;
# use breed_poll::PollError;

let mut builder = CatalogBuilder::new(GroupOrder::FirstSeen);
builder.add_breed("Border Collie", "Herding")?;
builder.add_breed("Poodle", "Non-Sporting")?;
let catalog = builder.build()?;

let form: HashMap<String, String> = [
    ("person_name", "Alice"),
    ("herding", "Border Collie"),
    ("best_in_show", "Poodle"),
]
.iter()
.map(|(k, v)| (k.to_string(), v.to_string()))
.collect();

let row = catalog.response_row("2024-05-01T10:00:00", &catalog.submission(&form));
assert_eq!(row.value_for("Herding"), Some("Border Collie"));
assert_eq!(row.value_for("Non-Sporting"), Some(""));
# Ok::<(), PollError>(())
```
*/
pub mod builder;
mod config;
pub mod response_log;

use log::debug;
use std::collections::HashMap;

pub use crate::config::*;

/// Turns a group display name into the identifier used as a form field.
///
/// The name is lowercased and every space and hyphen becomes an underscore.
/// Nothing else is changed.
pub fn normalize_group_key(group_name: &str) -> String {
    group_name
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BreedGroup {
    /// Display name, also used as the log column.
    pub name: String,
    /// Normalized form key.
    pub key: String,
    pub breeds: Vec<String>,
}

/// The breed reference data.
///
/// Invariants (checked by the builder): every breed belongs to exactly one
/// group, and the normalized keys of the groups are pairwise distinct.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Catalog {
    pub(crate) all_breeds: Vec<String>,
    pub(crate) groups: Vec<BreedGroup>,
    pub(crate) key_index: HashMap<String, usize>,
}

impl Catalog {
    /// All the breeds, in source order.
    pub fn all_breeds(&self) -> &[String] {
        &self.all_breeds
    }

    /// The groups, in catalog order.
    pub fn groups(&self) -> &[BreedGroup] {
        &self.groups
    }

    /// (normalized key, display name) for each group, in catalog order.
    pub fn group_keys(&self) -> Vec<(String, String)> {
        self.groups
            .iter()
            .map(|g| (g.key.clone(), g.name.clone()))
            .collect()
    }

    /// The position of the group owning this form key.
    pub fn group_index(&self, key: &str) -> Option<usize> {
        self.key_index.get(key).copied()
    }

    /// The header of a log written with this catalog.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = vec![TIMESTAMP_COLUMN.to_string(), NAME_COLUMN.to_string()];
        cols.extend(self.groups.iter().map(|g| g.name.clone()));
        cols.push(BEST_IN_SHOW_COLUMN.to_string());
        cols
    }

    /// Maps loosely-typed form fields onto a submission.
    ///
    /// Group fields are resolved through the key table. Unknown keys are ignored.
    pub fn submission(&self, form: &HashMap<String, String>) -> Submission {
        let mut group_picks: Vec<Option<String>> = vec![None; self.groups.len()];
        for (key, value) in form.iter() {
            match key.as_str() {
                PERSON_NAME_KEY | BEST_IN_SHOW_KEY => {}
                k => match self.group_index(k) {
                    Some(idx) => group_picks[idx] = Some(value.clone()),
                    None => debug!("submission: ignoring unknown form field {:?}", k),
                },
            }
        }
        Submission {
            person_name: form.get(PERSON_NAME_KEY).cloned(),
            group_picks,
            best_in_show: form.get(BEST_IN_SHOW_KEY).cloned(),
        }
    }

    /// Lays out a submission in log order. Missing fields become empty cells.
    pub fn response_row(&self, timestamp: &str, submission: &Submission) -> ResponseRow {
        let picks = self
            .groups
            .iter()
            .enumerate()
            .map(|(idx, g)| {
                let pick = submission
                    .group_picks
                    .get(idx)
                    .cloned()
                    .flatten()
                    .unwrap_or_default();
                (g.name.clone(), pick)
            })
            .collect();
        ResponseRow {
            timestamp: timestamp.to_string(),
            name: submission.person_name.clone().unwrap_or_default(),
            picks,
            best_in_show: submission.best_in_show.clone().unwrap_or_default(),
        }
    }
}
