use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;

use worldmap_core::entity::{Country, pack_color};
use worldmap_core::warning::Warning;

use crate::framework::{FolderLoader, FolderMerge, Merged};
use crate::loader::{DataLoadError, parse_records};
use crate::schema::CountryData;
use crate::tracker::UpstreamTracker;

/// Country tags in file order, duplicates removed.
#[derive(Debug, Clone, Default)]
pub struct CountryMap {
    pub countries: Vec<Country>,
    pub tags: BTreeSet<String>,
}

pub type CountriesLoader = FolderLoader<CountriesMerge>;

#[derive(Debug, Default)]
pub struct CountriesMerge;

#[async_trait]
impl FolderMerge for CountriesMerge {
    type Record = Country;
    type Output = CountryMap;

    fn parse(path: &str, text: &str) -> Result<Vec<Country>, DataLoadError> {
        let records: Vec<CountryData> = parse_records(path, text, "countries")?;
        Ok(records
            .into_iter()
            .map(|c| Country {
                tag: c.tag,
                color: pack_color(c.color),
                file: path.to_string(),
            })
            .collect())
    }

    async fn merge(
        &self,
        records: Vec<Country>,
        _upstream: &mut UpstreamTracker,
    ) -> Result<Merged<CountryMap>, DataLoadError> {
        let mut warnings = Vec::new();
        let mut first_file: BTreeMap<String, String> = BTreeMap::new();
        let mut countries = Vec::with_capacity(records.len());

        for country in records {
            match first_file.get(&country.tag) {
                Some(file) => warnings.push(
                    Warning::new(format!(
                        "Country tag {} is defined in both {} and {}.",
                        country.tag, file, country.file
                    ))
                    .with_file(file)
                    .with_file(&country.file),
                ),
                None => {
                    first_file.insert(country.tag.clone(), country.file.clone());
                    countries.push(country);
                }
            }
        }

        let tags = first_file.into_keys().collect();
        Ok(Merged {
            result: CountryMap { countries, tags },
            warnings,
        })
    }
}
