use log::{debug, warn};
use snafu::prelude::*;
use std::collections::HashMap;

pub use crate::config::*;
use crate::{normalize_group_key, BreedGroup, Catalog};

// Columns and form keys that are not groups.
const RESERVED_COLUMNS: [&str; 3] = [TIMESTAMP_COLUMN, NAME_COLUMN, BEST_IN_SHOW_COLUMN];
const RESERVED_KEYS: [&str; 2] = [PERSON_NAME_KEY, BEST_IN_SHOW_KEY];

/// A builder for assembling a catalog one breed at a time.
///
/// ```
/// use breed_poll::builder::CatalogBuilder;
/// use breed_poll::GroupOrder;
/// # use breed_poll::PollError;
///
/// let mut builder = CatalogBuilder::new(GroupOrder::FirstSeen);
/// builder.add_breed("Border Collie", "Herding")?;
/// builder.add_breed("Poodle", "Non-Sporting")?;
/// let catalog = builder.build()?;
///
/// assert_eq!(catalog.group_index("non_sporting"), Some(1));
/// # Ok::<(), PollError>(())
/// ```
pub struct CatalogBuilder {
    order: GroupOrder,
    breeds: Vec<String>,
    groups: Vec<(String, Vec<String>)>,
    // breed -> group name
    breed_groups: HashMap<String, String>,
    lineno: usize,
}

impl CatalogBuilder {
    pub fn new(order: GroupOrder) -> CatalogBuilder {
        CatalogBuilder {
            order,
            breeds: Vec::new(),
            groups: Vec::new(),
            breed_groups: HashMap::new(),
            lineno: 1,
        }
    }

    /// Adds a breed without source position information.
    pub fn add_breed(&mut self, breed: &str, group: &str) -> PollResult<()> {
        self.lineno += 1;
        self.add_record(&CatalogRecord {
            breed: breed.to_string(),
            group: group.to_string(),
            lineno: self.lineno,
        })
    }

    /// Adds a breed as read from a catalog source.
    ///
    /// A breed repeated under the same group is skipped. A breed repeated
    /// under a different group is an error.
    pub fn add_record(&mut self, record: &CatalogRecord) -> PollResult<()> {
        // Names are kept exactly as written; a blank cell is still an error.
        let breed = record.breed.as_str();
        let group = record.group.as_str();
        let lineno = record.lineno;
        ensure!(
            !breed.trim().is_empty(),
            EmptyCatalogCellSnafu {
                column: "breed",
                lineno
            }
        );
        ensure!(
            !group.trim().is_empty(),
            EmptyCatalogCellSnafu {
                column: "group",
                lineno
            }
        );

        if let Some(first) = self.breed_groups.get(breed) {
            ensure!(
                first == group,
                BreedInMultipleGroupsSnafu {
                    breed,
                    first: first.clone(),
                    second: group,
                    lineno
                }
            );
            warn!(
                "add_record: line {}: skipping duplicate breed {:?} in group {:?}",
                lineno, breed, group
            );
            return Ok(());
        }

        self.breed_groups
            .insert(breed.to_string(), group.to_string());
        self.breeds.push(breed.to_string());
        match self.groups.iter_mut().find(|(name, _)| name == group) {
            Some((_, members)) => members.push(breed.to_string()),
            None => self
                .groups
                .push((group.to_string(), vec![breed.to_string()])),
        }
        Ok(())
    }

    /// Adds all the records, stopping at the first invalid one.
    pub fn add_records(&mut self, records: &[CatalogRecord]) -> PollResult<()> {
        for record in records {
            self.add_record(record)?;
        }
        Ok(())
    }

    /// Checks the form keys and freezes the catalog.
    ///
    /// A group may not share its name with a fixed log column, nor its key
    /// with a fixed form field.
    pub fn build(self) -> PollResult<Catalog> {
        ensure!(!self.breeds.is_empty(), EmptyCatalogSnafu {});

        let mut groups = self.groups;
        if self.order == GroupOrder::Alphabetical {
            groups.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut key_index: HashMap<String, usize> = HashMap::new();
        let mut res: Vec<BreedGroup> = Vec::new();
        for (idx, (name, breeds)) in groups.into_iter().enumerate() {
            let key = normalize_group_key(&name);
            ensure!(
                !RESERVED_COLUMNS.contains(&name.as_str()) && !RESERVED_KEYS.contains(&key.as_str()),
                ReservedGroupNameSnafu { name, key }
            );
            if let Some(&other) = key_index.get(&key) {
                return DuplicateGroupKeySnafu {
                    key,
                    first: res[other].name.clone(),
                    second: name,
                }
                .fail();
            }
            debug!("build: group {:?} -> key {:?} ({} breeds)", name, key, breeds.len());
            key_index.insert(key.clone(), idx);
            res.push(BreedGroup { name, key, breeds });
        }

        Ok(Catalog {
            all_breeds: self.breeds,
            groups: res,
            key_index,
        })
    }
}
