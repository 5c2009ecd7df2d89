use std::fmt::{Display, Formatter};

/// Fine-grained generation category of a source.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Category {
    Solar,
    WindOnshore,
    WindOffshore,
    HydroRunOfRiver,
    HydroReservoir,
    HydroPumpedStorage,
    Biomass,
    Geothermal,
    Nuclear,
    FossilGas,
    FossilHardCoal,
    FossilLignite,
    FossilOil,
    FossilCoalDerivedGas,
    BatteryStorage,
    Waste,
    Other,
}

impl Category {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Solar => "solar",
            Self::WindOnshore => "wind_onshore",
            Self::WindOffshore => "wind_offshore",
            Self::HydroRunOfRiver => "hydro_run_of_river",
            Self::HydroReservoir => "hydro_reservoir",
            Self::HydroPumpedStorage => "hydro_pumped_storage",
            Self::Biomass => "biomass",
            Self::Geothermal => "geothermal",
            Self::Nuclear => "nuclear",
            Self::FossilGas => "fossil_gas",
            Self::FossilHardCoal => "fossil_hard_coal",
            Self::FossilLignite => "fossil_lignite",
            Self::FossilOil => "fossil_oil",
            Self::FossilCoalDerivedGas => "fossil_coal_derived_gas",
            Self::BatteryStorage => "battery_storage",
            Self::Waste => "waste",
            Self::Other => "other",
        }
    }

    /// Storage falls into [`Class::Other`], never renewable.
    #[must_use]
    pub const fn class(self) -> Class {
        match self {
            Self::Solar
            | Self::WindOnshore
            | Self::WindOffshore
            | Self::HydroRunOfRiver
            | Self::HydroReservoir
            | Self::Biomass
            | Self::Geothermal => Class::Renewable,
            Self::Nuclear => Class::Nuclear,
            Self::FossilGas
            | Self::FossilHardCoal
            | Self::FossilLignite
            | Self::FossilOil
            | Self::FossilCoalDerivedGas => Class::Fossil,
            Self::HydroPumpedStorage | Self::BatteryStorage | Self::Waste | Self::Other => {
                Class::Other
            }
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Top-level split used by the renewable, fossil, and nuclear totals.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Class {
    Renewable,
    Fossil,
    Nuclear,
    Other,
}

impl Class {
    pub const ALL: [Self; 4] = [Self::Renewable, Self::Fossil, Self::Nuclear, Self::Other];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Renewable => "renewable",
            Self::Fossil => "fossil",
            Self::Nuclear => "nuclear",
            Self::Other => "other",
        }
    }
}

/// Groups of categories that get their own total sensor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum CategoryGroup {
    Solar,
    Wind,
    Hydro,
    Fossil,
}

impl CategoryGroup {
    pub const ALL: [Self; 4] = [Self::Solar, Self::Wind, Self::Hydro, Self::Fossil];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Solar => "solar_total",
            Self::Wind => "wind_total",
            Self::Hydro => "hydro_total",
            Self::Fossil => "fossil_total",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Solar => "Solar Total",
            Self::Wind => "Wind Total",
            Self::Hydro => "Hydro Total",
            Self::Fossil => "Fossil Total",
        }
    }

    #[must_use]
    pub const fn members(self) -> &'static [Category] {
        match self {
            Self::Solar => &[Category::Solar],
            Self::Wind => &[Category::WindOnshore, Category::WindOffshore],
            Self::Hydro => &[
                Category::HydroRunOfRiver,
                Category::HydroReservoir,
                Category::HydroPumpedStorage,
            ],
            Self::Fossil => &[
                Category::FossilGas,
                Category::FossilHardCoal,
                Category::FossilLignite,
                Category::FossilOil,
                Category::FossilCoalDerivedGas,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn test_groups_are_disjoint() {
        let members = CategoryGroup::ALL.iter().flat_map(|group| group.members()).collect_vec();
        assert!(members.iter().all_unique());
        assert!(
            CategoryGroup::Fossil.members().iter().all(|category| category.class() == Class::Fossil)
        );
    }

    #[test]
    fn test_storage_is_not_renewable() {
        assert_eq!(Category::HydroPumpedStorage.class(), Class::Other);
        assert_eq!(Category::BatteryStorage.class(), Class::Other);
        assert_eq!(Category::HydroRunOfRiver.class(), Class::Renewable);
    }
}
