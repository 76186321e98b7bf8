use serde::Serialize;

/// Measurement a result item reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Systolic,
    Diastolic,
    Pulse,
    Weight,
    Temperature,
    Breath,
    GlucoseLevel,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Systolic,
        Metric::Diastolic,
        Metric::Pulse,
        Metric::Weight,
        Metric::Temperature,
        Metric::Breath,
        Metric::GlucoseLevel,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Systolic => "Systolic",
            Metric::Diastolic => "Diastolic",
            Metric::Pulse => "Pulse",
            Metric::Weight => "Weight",
            Metric::Temperature => "Temperature",
            Metric::Breath => "Breath",
            Metric::GlucoseLevel => "Glucose",
        }
    }

    /// Record type code used by the storage layer.
    pub fn type_code(&self) -> u32 {
        match self {
            Metric::Systolic => 3,
            Metric::Diastolic => 4,
            Metric::Pulse => 1,
            Metric::Weight => 6,
            Metric::Temperature => 7,
            Metric::Breath => 2,
            Metric::GlucoseLevel => 8,
        }
    }

    pub fn unit(&self) -> UnitKind {
        match self {
            Metric::Systolic | Metric::Diastolic => UnitKind::MmHg,
            Metric::Pulse => UnitKind::Beats,
            Metric::Weight => UnitKind::Kg,
            Metric::Temperature => UnitKind::Celsius,
            Metric::Breath => UnitKind::PerMinute,
            Metric::GlucoseLevel => UnitKind::MgDl,
        }
    }

    pub fn from_display_name(name: &str) -> Option<Metric> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.display_name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Celsius,
    Kg,
    MmHg,
    MgDl,
    MmolL,
    PerMinute,
    Beats,
    Undefined,
}

impl UnitKind {
    pub const ALL: [UnitKind; 8] = [
        UnitKind::Celsius,
        UnitKind::Kg,
        UnitKind::MmHg,
        UnitKind::MgDl,
        UnitKind::MmolL,
        UnitKind::PerMinute,
        UnitKind::Beats,
        UnitKind::Undefined,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            UnitKind::Celsius => "°C",
            UnitKind::Kg => "KG",
            UnitKind::MmHg => "mmHg",
            UnitKind::MgDl => "mg/dL",
            UnitKind::MmolL => "mmol/L",
            UnitKind::PerMinute => "/min",
            UnitKind::Beats => "bpm",
            UnitKind::Undefined => "unknown",
        }
    }

    /// Unit code used by the storage layer; only mg/dL differs.
    pub fn code(&self) -> u32 {
        match self {
            UnitKind::MgDl => 2,
            _ => 1,
        }
    }

    /// The other glucose unit a reading can be shown in.
    pub fn glucose_alternate(&self) -> Option<UnitKind> {
        match self {
            UnitKind::MgDl => Some(UnitKind::MmolL),
            UnitKind::MmolL => Some(UnitKind::MgDl),
            _ => None,
        }
    }

    pub fn from_display_name(name: &str) -> Option<UnitKind> {
        UnitKind::ALL
            .into_iter()
            .find(|unit| unit.display_name() == name)
    }
}

/// Glucose concentration unit chosen for a glucose-meter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseUnit {
    MgDl,
    MmolL,
}

impl GlucoseUnit {
    pub fn unit(&self) -> UnitKind {
        match self {
            GlucoseUnit::MgDl => UnitKind::MgDl,
            GlucoseUnit::MmolL => UnitKind::MmolL,
        }
    }

    pub fn alternate(&self) -> GlucoseUnit {
        match self {
            GlucoseUnit::MgDl => GlucoseUnit::MmolL,
            GlucoseUnit::MmolL => GlucoseUnit::MgDl,
        }
    }
}
