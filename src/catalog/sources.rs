use crate::{
    catalog::{Category, Class},
    settings::{
        Country,
        Language::{self, De, En, Es, Fr, It},
    },
};

/// Static description of a generation source.
#[derive(Debug)]
pub struct SourceDefinition {
    pub id: &'static str,
    pub category: Category,
    pub color: &'static str,
    pub renewable: bool,

    /// The upstream service also publishes a `{id}_forecast` series.
    pub forecast: bool,

    names: &'static [(Language, &'static str)],
    aliases: &'static [&'static str],
}

impl SourceDefinition {
    const fn new(
        id: &'static str,
        category: Category,
        color: &'static str,
        names: &'static [(Language, &'static str)],
    ) -> Self {
        Self {
            id,
            category,
            color,
            renewable: matches!(category.class(), Class::Renewable),
            forecast: false,
            names,
            aliases: &[],
        }
    }

    const fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn with_forecast(mut self) -> Self {
        self.forecast = true;
        self
    }

    /// Name in the requested language, falling back to English.
    pub fn name(&self, language: Language) -> Option<&'static str> {
        self.names
            .iter()
            .find(|(it, _)| *it == language)
            .or_else(|| self.names.iter().find(|(it, _)| *it == Language::En))
            .map(|(_, name)| *name)
    }

    pub fn matches(&self, id: &str) -> bool {
        self.id == id || self.aliases.contains(&id)
    }
}

pub static SOURCES: &[SourceDefinition] = &[
    SourceDefinition::new(
        "solar",
        Category::Solar,
        "#ffcd64",
        &[(En, "Solar"), (De, "Solar"), (Fr, "Solaire"), (It, "Solare"), (Es, "Solar")],
    )
    .with_aliases(&["photovoltaic", "pv"])
    .with_forecast(),
    SourceDefinition::new(
        "wind_onshore",
        Category::WindOnshore,
        "#2b92d1",
        &[
            (En, "Wind onshore"),
            (De, "Wind onshore"),
            (Fr, "Éolien terrestre"),
            (It, "Eolico onshore"),
            (Es, "Eólica terrestre"),
        ],
    )
    .with_forecast(),
    SourceDefinition::new(
        "wind_offshore",
        Category::WindOffshore,
        "#1a5a8a",
        &[
            (En, "Wind offshore"),
            (De, "Wind offshore"),
            (Fr, "Éolien en mer"),
            (It, "Eolico offshore"),
            (Es, "Eólica marina"),
        ],
    )
    .with_forecast(),
    SourceDefinition::new(
        "hydro_run_of_river",
        Category::HydroRunOfRiver,
        "#0068b3",
        &[
            (En, "Hydro Run-of-River"),
            (De, "Laufwasser"),
            (Fr, "Hydraulique au fil de l'eau"),
            (It, "Idroelettrico ad acqua fluente"),
            (Es, "Hidráulica fluyente"),
        ],
    )
    .with_aliases(&[
        "run_of_river",
        "hydro_run_of_river_and_poundage",
        "hydro_run_of_river_poundage",
    ]),
    SourceDefinition::new(
        "hydro_water_reservoir",
        Category::HydroReservoir,
        "#4b8bc4",
        &[
            (En, "Hydro water reservoir"),
            (De, "Speicherwasser"),
            (Fr, "Hydraulique de lac"),
            (It, "Idroelettrico a bacino"),
            (Es, "Hidráulica de embalse"),
        ],
    )
    .with_aliases(&["hydro_reservoir", "reservoir"]),
    SourceDefinition::new(
        "hydro_pumped_storage",
        Category::HydroPumpedStorage,
        "#56a8e0",
        &[
            (En, "Hydro pumped storage"),
            (De, "Pumpspeicher"),
            (Fr, "Pompage-turbinage"),
            (It, "Pompaggio"),
            (Es, "Bombeo"),
        ],
    )
    .with_aliases(&["pumped_storage"]),
    SourceDefinition::new(
        "hydro_pumped_storage_consumption",
        Category::HydroPumpedStorage,
        "#8cc8ee",
        &[
            (En, "Hydro pumped storage consumption"),
            (De, "Pumpspeicher Verbrauch"),
            (Fr, "Consommation de pompage"),
            (It, "Consumo pompaggio"),
            (Es, "Consumo de bombeo"),
        ],
    ),
    SourceDefinition::new(
        "biomass",
        Category::Biomass,
        "#00a000",
        &[(En, "Biomass"), (De, "Biomasse"), (Fr, "Biomasse"), (It, "Biomassa"), (Es, "Biomasa")],
    ),
    SourceDefinition::new(
        "geothermal",
        Category::Geothermal,
        "#c8553d",
        &[
            (En, "Geothermal"),
            (De, "Geothermie"),
            (Fr, "Géothermie"),
            (It, "Geotermico"),
            (Es, "Geotérmica"),
        ],
    ),
    SourceDefinition::new(
        "nuclear",
        Category::Nuclear,
        "#a3007a",
        &[
            (En, "Nuclear"),
            (De, "Kernenergie"),
            (Fr, "Nucléaire"),
            (It, "Nucleare"),
            (Es, "Nuclear"),
        ],
    ),
    SourceDefinition::new(
        "fossil_gas",
        Category::FossilGas,
        "#e8a33d",
        &[
            (En, "Fossil gas"),
            (De, "Erdgas"),
            (Fr, "Gaz fossile"),
            (It, "Gas fossile"),
            (Es, "Gas fósil"),
        ],
    )
    .with_aliases(&["gas", "natural_gas"]),
    SourceDefinition::new(
        "fossil_hard_coal",
        Category::FossilHardCoal,
        "#5c5c5c",
        &[
            (En, "Fossil hard coal"),
            (De, "Steinkohle"),
            (Fr, "Houille"),
            (It, "Carbone fossile"),
            (Es, "Hulla"),
        ],
    )
    .with_aliases(&["hard_coal", "coal"]),
    SourceDefinition::new(
        "fossil_brown_coal_lignite",
        Category::FossilLignite,
        "#8b5a2b",
        &[
            (En, "Fossil brown coal / lignite"),
            (De, "Braunkohle"),
            (Fr, "Lignite"),
            (It, "Lignite"),
            (Es, "Lignito"),
        ],
    )
    .with_aliases(&["lignite", "brown_coal", "fossil_brown_coal", "fossil_lignite"]),
    SourceDefinition::new(
        "fossil_oil",
        Category::FossilOil,
        "#303030",
        &[(En, "Fossil oil"), (De, "Öl"), (Fr, "Fioul"), (It, "Petrolio"), (Es, "Petróleo")],
    )
    .with_aliases(&["oil"]),
    SourceDefinition::new(
        "fossil_coal_derived_gas",
        Category::FossilCoalDerivedGas,
        "#7a6a55",
        &[
            (En, "Fossil coal-derived gas"),
            (De, "Kohlegas"),
            (Fr, "Gaz dérivé du charbon"),
            (It, "Gas derivato dal carbone"),
            (Es, "Gas derivado del carbón"),
        ],
    ),
    SourceDefinition::new(
        "battery_storage",
        Category::BatteryStorage,
        "#b0e0a0",
        &[
            (En, "Battery storage"),
            (De, "Batteriespeicher"),
            (Fr, "Stockage par batterie"),
            (It, "Accumulo a batteria"),
            (Es, "Almacenamiento en baterías"),
        ],
    )
    .with_aliases(&["battery", "batteries"]),
    SourceDefinition::new(
        "waste",
        Category::Waste,
        "#7f7f3f",
        &[(En, "Waste"), (De, "Müll"), (Fr, "Déchets"), (It, "Rifiuti"), (Es, "Residuos")],
    ),
    SourceDefinition::new(
        "others",
        Category::Other,
        "#a0a0a0",
        &[(En, "Others"), (De, "Andere"), (Fr, "Autres"), (It, "Altri"), (Es, "Otros")],
    )
    .with_aliases(&["other"]),
];

/// Source IDs with an individual sensor, per country.
pub const fn country_sources(country: Country) -> &'static [&'static str] {
    match country {
        Country::De => &[
            "hydro_pumped_storage",
            "biomass",
            "hydro_run_of_river",
            "hydro_water_reservoir",
            "geothermal",
            "nuclear",
            "fossil_brown_coal_lignite",
            "fossil_hard_coal",
            "fossil_oil",
            "fossil_coal_derived_gas",
            "fossil_gas",
            "waste",
            "others",
            "wind_offshore",
            "wind_onshore",
            "solar",
            "battery_storage",
        ],
        Country::At => &[
            "hydro_run_of_river",
            "hydro_water_reservoir",
            "hydro_pumped_storage",
            "biomass",
            "fossil_gas",
            "fossil_hard_coal",
            "fossil_oil",
            "waste",
            "others",
            "wind_onshore",
            "solar",
        ],
        Country::Ch => &[
            "nuclear",
            "hydro_run_of_river",
            "hydro_water_reservoir",
            "hydro_pumped_storage",
            "biomass",
            "waste",
            "wind_onshore",
            "solar",
        ],
        Country::Fr => &[
            "nuclear",
            "hydro_run_of_river",
            "hydro_water_reservoir",
            "hydro_pumped_storage",
            "biomass",
            "fossil_gas",
            "fossil_hard_coal",
            "fossil_oil",
            "waste",
            "wind_offshore",
            "wind_onshore",
            "solar",
        ],
        Country::Nl => &[
            "nuclear",
            "biomass",
            "fossil_gas",
            "fossil_hard_coal",
            "waste",
            "others",
            "wind_offshore",
            "wind_onshore",
            "solar",
        ],
        Country::Be => &[
            "nuclear",
            "hydro_run_of_river",
            "hydro_pumped_storage",
            "biomass",
            "fossil_gas",
            "waste",
            "others",
            "wind_offshore",
            "wind_onshore",
            "solar",
        ],
        Country::Pl => &[
            "hydro_run_of_river",
            "hydro_water_reservoir",
            "hydro_pumped_storage",
            "biomass",
            "fossil_brown_coal_lignite",
            "fossil_hard_coal",
            "fossil_coal_derived_gas",
            "fossil_gas",
            "fossil_oil",
            "others",
            "wind_onshore",
            "solar",
        ],
        Country::Cz => &[
            "nuclear",
            "hydro_run_of_river",
            "hydro_water_reservoir",
            "hydro_pumped_storage",
            "biomass",
            "fossil_brown_coal_lignite",
            "fossil_hard_coal",
            "fossil_coal_derived_gas",
            "fossil_gas",
            "fossil_oil",
            "waste",
            "others",
            "wind_onshore",
            "solar",
        ],
    }
}

/// Series that are published alongside the generation mix but are not generation.
pub const NON_GENERATION: &[&str] = &[
    "load",
    "residual_load",
    "renewable_share",
    "cross_border",
    "import_balance",
    "day_ahead",
    "intraday",
];
