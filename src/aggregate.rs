use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    catalog::{Category, CategoryGroup, Class, SourceCatalog},
    quantity::{percent::Percent, power::Megawatts},
    settings::{Language, Settings},
    snapshot::Snapshot,
};

/// How the top sources get ranked and named.
#[derive(Copy, Clone, Debug)]
pub struct Ranking {
    pub limit: usize,
    pub language: Language,
}

impl From<&Settings> for Ranking {
    fn from(settings: &Settings) -> Self {
        Self { limit: settings.top_n, language: settings.language }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RankedSource {
    pub source_id: String,
    pub name: String,
    pub power: Megawatts,
}

/// Totals derived from a single snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    /// Signed sum of all defined readings, storage charging included.
    pub total: Megawatts,

    pub renewable: Megawatts,
    pub fossil: Megawatts,
    pub nuclear: Megawatts,
    pub other: Megawatts,

    /// Undefined unless the total is positive.
    pub renewable_share: Option<Percent>,

    /// Every category with at least one defined reading.
    pub category_totals: BTreeMap<Category, Megawatts>,

    /// Descending by power, ties by source ID.
    pub top_n: Vec<RankedSource>,

    /// Sources with a defined value.
    pub source_count: usize,

    /// Sources whose value is undefined in this snapshot.
    pub source_count_unknown: usize,

    /// Sources that are not in the catalog and went into «other».
    pub source_count_unrecognized: usize,
}

impl Aggregate {
    pub fn category_total(&self, category: Category) -> Option<Megawatts> {
        self.category_totals.get(&category).copied()
    }

    /// Sum over the categories, undefined when none of them has been observed.
    pub fn sum_of(&self, categories: &[Category]) -> Option<Megawatts> {
        categories
            .iter()
            .filter_map(|category| self.category_total(*category))
            .reduce(|lhs, rhs| lhs + rhs)
    }

    pub fn group_total(&self, group: CategoryGroup) -> Option<Megawatts> {
        self.sum_of(group.members())
    }

    pub const fn class_total(&self, class: Class) -> Megawatts {
        match class {
            Class::Renewable => self.renewable,
            Class::Fossil => self.fossil,
            Class::Nuclear => self.nuclear,
            Class::Other => self.other,
        }
    }
}

/// Aggregate the snapshot, this is a pure function of its inputs.
pub fn aggregate(snapshot: &Snapshot, catalog: &SourceCatalog, ranking: Ranking) -> Aggregate {
    let mut total = Megawatts::ZERO;
    let mut class_totals: BTreeMap<Class, Megawatts> = BTreeMap::new();
    let mut category_totals: BTreeMap<Category, Megawatts> = BTreeMap::new();
    let mut source_count = 0;
    let mut source_count_unknown = 0;
    let mut source_count_unrecognized = 0;

    for reading in &snapshot.readings {
        if !catalog.is_recognized(&reading.source_id) {
            source_count_unrecognized += 1;
        }
        let Some(power) = reading.power else {
            source_count_unknown += 1;
            continue;
        };
        source_count += 1;
        total += power;
        let category = catalog.category(&reading.source_id);
        *category_totals.entry(category).or_default() += power;
        *class_totals.entry(category.class()).or_default() += power;
    }

    let class_total = |class| class_totals.get(&class).copied().unwrap_or_default();
    let renewable = class_total(Class::Renewable);

    let top_n = snapshot
        .readings
        .iter()
        .filter_map(|reading| Some((reading, reading.power?)))
        .sorted_by(|(lhs, lhs_power), (rhs, rhs_power)| {
            rhs_power.cmp(lhs_power).then_with(|| lhs.source_id.cmp(&rhs.source_id))
        })
        .take(ranking.limit)
        .map(|(reading, power)| RankedSource {
            source_id: reading.source_id.clone(),
            name: catalog.display_name(&reading.source_id, ranking.language).into_owned(),
            power,
        })
        .collect();

    Aggregate {
        total,
        renewable,
        fossil: class_total(Class::Fossil),
        nuclear: class_total(Class::Nuclear),
        other: class_total(Class::Other),
        renewable_share: renewable.share_of(total),
        category_totals,
        top_n,
        source_count,
        source_count_unknown,
        source_count_unrecognized,
    }
}
