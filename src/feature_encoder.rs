//! Feature engineering for Titanic survival model inference.
//!
//! Maps a validated passenger onto the 30 columns the classifier was trained
//! on. Derived columns are named struct fields and the row is assembled by an
//! exhaustive match over [`FeatureName`], so a column can never be silently
//! left at a default value.

use crate::error::PredictionError;
use crate::types::passenger::{Passenger, PassengerClass, Port, Sex};
use std::fmt;
use std::str::FromStr;

/// Number of columns in the trained schema
pub const FEATURE_COUNT: usize = 30;

/// Fares strictly below this are "low"
const LOW_FARE_LIMIT: f64 = 10.0;
/// Upper edge (inclusive) of the child age bin
const CHILD_AGE_LIMIT: f64 = 12.0;
/// Upper edge (inclusive) of the adult age bin, also the elderly cut-off
const ELDERLY_AGE_LIMIT: f64 = 60.0;

/// Discretized age used by the model instead of raw age.
///
/// Bins are right-closed: `[0, 12] -> Child`, `(12, 60] -> Adult`,
/// `(60, 100] -> Senior`. Age 0 is placed in the child bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBin {
    Child = 0,
    Adult = 1,
    Senior = 2,
}

impl AgeBin {
    pub fn from_age(age: f64) -> Self {
        if age <= CHILD_AGE_LIMIT {
            AgeBin::Child
        } else if age <= ELDERLY_AGE_LIMIT {
            AgeBin::Adult
        } else {
            AgeBin::Senior
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Column names of the trained schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureName {
    Age,
    SibSp,
    Parch,
    Fare,
    FamilySize,
    IsAlone,
    ModerateFamily,
    LowFare,
    LowFare3rdClass,
    AgeBin,
    IsChildOrElderly,
    IsCherbourg,
    FemaleFirstSecondClass,
    SexFemale,
    SexMale,
    EmbarkedC,
    EmbarkedQ,
    EmbarkedS,
    Pclass1,
    Pclass2,
    Pclass3,
    CabinA,
    CabinB,
    CabinC,
    CabinD,
    CabinE,
    CabinF,
    CabinG,
    CabinT,
    CabinU,
}

impl FeatureName {
    /// Every column, in the default trained order
    pub const ALL: [FeatureName; FEATURE_COUNT] = [
        FeatureName::Age,
        FeatureName::SibSp,
        FeatureName::Parch,
        FeatureName::Fare,
        FeatureName::FamilySize,
        FeatureName::IsAlone,
        FeatureName::ModerateFamily,
        FeatureName::LowFare,
        FeatureName::LowFare3rdClass,
        FeatureName::AgeBin,
        FeatureName::IsChildOrElderly,
        FeatureName::IsCherbourg,
        FeatureName::FemaleFirstSecondClass,
        FeatureName::SexFemale,
        FeatureName::SexMale,
        FeatureName::EmbarkedC,
        FeatureName::EmbarkedQ,
        FeatureName::EmbarkedS,
        FeatureName::Pclass1,
        FeatureName::Pclass2,
        FeatureName::Pclass3,
        FeatureName::CabinA,
        FeatureName::CabinB,
        FeatureName::CabinC,
        FeatureName::CabinD,
        FeatureName::CabinE,
        FeatureName::CabinF,
        FeatureName::CabinG,
        FeatureName::CabinT,
        FeatureName::CabinU,
    ];

    /// Column name as it appeared in the training frame
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureName::Age => "Age",
            FeatureName::SibSp => "SibSp",
            FeatureName::Parch => "Parch",
            FeatureName::Fare => "Fare",
            FeatureName::FamilySize => "FamilySize",
            FeatureName::IsAlone => "IsAlone",
            FeatureName::ModerateFamily => "ModerateFamily",
            FeatureName::LowFare => "LowFare",
            FeatureName::LowFare3rdClass => "LowFare_3rdClass",
            FeatureName::AgeBin => "AgeBin",
            FeatureName::IsChildOrElderly => "IsChildOrElderly",
            FeatureName::IsCherbourg => "IsCherbourg",
            FeatureName::FemaleFirstSecondClass => "FemaleFirstSecondClass",
            FeatureName::SexFemale => "Sex_female",
            FeatureName::SexMale => "Sex_male",
            FeatureName::EmbarkedC => "Embarked_C",
            FeatureName::EmbarkedQ => "Embarked_Q",
            FeatureName::EmbarkedS => "Embarked_S",
            FeatureName::Pclass1 => "Pclass_1",
            FeatureName::Pclass2 => "Pclass_2",
            FeatureName::Pclass3 => "Pclass_3",
            FeatureName::CabinA => "Cabin_A",
            FeatureName::CabinB => "Cabin_B",
            FeatureName::CabinC => "Cabin_C",
            FeatureName::CabinD => "Cabin_D",
            FeatureName::CabinE => "Cabin_E",
            FeatureName::CabinF => "Cabin_F",
            FeatureName::CabinG => "Cabin_G",
            FeatureName::CabinT => "Cabin_T",
            FeatureName::CabinU => "Cabin_U",
        }
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| PredictionError::Schema(format!("unknown feature column {:?}", s)))
    }
}

/// Ordered column layout of the model input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    columns: Vec<FeatureName>,
}

impl FeatureSchema {
    /// Build a schema from trained column names.
    ///
    /// The names must cover every column exactly once.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, PredictionError> {
        if names.len() != FEATURE_COUNT {
            return Err(PredictionError::Schema(format!(
                "expected {} columns, got {}",
                FEATURE_COUNT,
                names.len()
            )));
        }

        let mut columns = Vec::with_capacity(FEATURE_COUNT);
        for name in names {
            let column: FeatureName = name.as_ref().parse()?;
            if columns.contains(&column) {
                return Err(PredictionError::Schema(format!(
                    "column {} listed more than once",
                    column
                )));
            }
            columns.push(column);
        }

        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[FeatureName] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of a column in the row
    pub fn index_of(&self, name: FeatureName) -> Option<usize> {
        self.columns.iter().position(|&c| c == name)
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self {
            columns: FeatureName::ALL.to_vec(),
        }
    }
}

/// Encoded passenger, one named field per trained column.
///
/// Flags are 0.0 / 1.0; `Age`, `SibSp`, `Parch` and `Fare` are passed through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub age: f32,
    pub sib_sp: f32,
    pub parch: f32,
    pub fare: f32,
    pub family_size: f32,
    pub is_alone: f32,
    pub moderate_family: f32,
    pub low_fare: f32,
    pub low_fare_3rd_class: f32,
    pub age_bin: f32,
    pub is_child_or_elderly: f32,
    pub is_cherbourg: f32,
    pub female_first_second_class: f32,
    pub sex_female: f32,
    pub sex_male: f32,
    pub embarked_c: f32,
    pub embarked_q: f32,
    pub embarked_s: f32,
    pub pclass_1: f32,
    pub pclass_2: f32,
    pub pclass_3: f32,
    pub cabin_a: f32,
    pub cabin_b: f32,
    pub cabin_c: f32,
    pub cabin_d: f32,
    pub cabin_e: f32,
    pub cabin_f: f32,
    pub cabin_g: f32,
    pub cabin_t: f32,
    pub cabin_u: f32,
}

impl FeatureVector {
    /// Value of a single column
    pub fn get(&self, name: FeatureName) -> f32 {
        match name {
            FeatureName::Age => self.age,
            FeatureName::SibSp => self.sib_sp,
            FeatureName::Parch => self.parch,
            FeatureName::Fare => self.fare,
            FeatureName::FamilySize => self.family_size,
            FeatureName::IsAlone => self.is_alone,
            FeatureName::ModerateFamily => self.moderate_family,
            FeatureName::LowFare => self.low_fare,
            FeatureName::LowFare3rdClass => self.low_fare_3rd_class,
            FeatureName::AgeBin => self.age_bin,
            FeatureName::IsChildOrElderly => self.is_child_or_elderly,
            FeatureName::IsCherbourg => self.is_cherbourg,
            FeatureName::FemaleFirstSecondClass => self.female_first_second_class,
            FeatureName::SexFemale => self.sex_female,
            FeatureName::SexMale => self.sex_male,
            FeatureName::EmbarkedC => self.embarked_c,
            FeatureName::EmbarkedQ => self.embarked_q,
            FeatureName::EmbarkedS => self.embarked_s,
            FeatureName::Pclass1 => self.pclass_1,
            FeatureName::Pclass2 => self.pclass_2,
            FeatureName::Pclass3 => self.pclass_3,
            FeatureName::CabinA => self.cabin_a,
            FeatureName::CabinB => self.cabin_b,
            FeatureName::CabinC => self.cabin_c,
            FeatureName::CabinD => self.cabin_d,
            FeatureName::CabinE => self.cabin_e,
            FeatureName::CabinF => self.cabin_f,
            FeatureName::CabinG => self.cabin_g,
            FeatureName::CabinT => self.cabin_t,
            FeatureName::CabinU => self.cabin_u,
        }
    }

    /// Lay the vector out in schema order
    pub fn to_row(&self, schema: &FeatureSchema) -> Vec<f32> {
        schema.columns().iter().map(|&c| self.get(c)).collect()
    }
}

fn flag(condition: bool) -> f32 {
    if condition {
        1.0
    } else {
        0.0
    }
}

/// Feature encoder that turns passengers into model input rows.
///
/// Pure: no I/O, and total over every validated [`Passenger`].
#[derive(Debug, Clone, Default)]
pub struct FeatureEncoder {
    schema: FeatureSchema,
}

impl FeatureEncoder {
    /// Encoder using the default trained column order
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder laying rows out in a custom column order
    pub fn with_schema(schema: FeatureSchema) -> Self {
        Self { schema }
    }

    /// Derive every feature of a passenger
    pub fn encode(&self, passenger: &Passenger) -> FeatureVector {
        let pclass = passenger.pclass();
        let sex = passenger.sex();
        let embarked = passenger.embarked();
        let age = passenger.age();
        let fare = passenger.fare();

        let family_size = u32::from(passenger.sib_sp()) + u32::from(passenger.parch()) + 1;
        let low_fare = fare < LOW_FARE_LIMIT;
        let is_female = sex == Sex::Female;

        FeatureVector {
            age: age as f32,
            sib_sp: f32::from(passenger.sib_sp()),
            parch: f32::from(passenger.parch()),
            fare: fare as f32,
            family_size: family_size as f32,
            is_alone: flag(family_size == 1),
            moderate_family: flag((2..=4).contains(&family_size)),
            low_fare: flag(low_fare),
            low_fare_3rd_class: flag(low_fare && pclass == PassengerClass::Third),
            age_bin: f32::from(AgeBin::from_age(age).code()),
            is_child_or_elderly: flag(age <= CHILD_AGE_LIMIT || age >= ELDERLY_AGE_LIMIT),
            is_cherbourg: flag(embarked == Port::Cherbourg),
            female_first_second_class: flag(is_female && pclass != PassengerClass::Third),
            sex_female: flag(is_female),
            sex_male: flag(sex == Sex::Male),
            embarked_c: flag(embarked == Port::Cherbourg),
            embarked_q: flag(embarked == Port::Queenstown),
            embarked_s: flag(embarked == Port::Southampton),
            pclass_1: flag(pclass == PassengerClass::First),
            pclass_2: flag(pclass == PassengerClass::Second),
            pclass_3: flag(pclass == PassengerClass::Third),
            // Cabin is never known at inference time
            cabin_a: 0.0,
            cabin_b: 0.0,
            cabin_c: 0.0,
            cabin_d: 0.0,
            cabin_e: 0.0,
            cabin_f: 0.0,
            cabin_g: 0.0,
            cabin_t: 0.0,
            cabin_u: 1.0,
        }
    }

    /// Encode a passenger straight into a model input row
    pub fn encode_row(&self, passenger: &Passenger) -> Vec<f32> {
        self.encode(passenger).to_row(&self.schema)
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.schema.len()
    }

    /// Get feature names in row order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        self.schema.names()
    }
}
