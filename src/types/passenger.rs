//! Passenger records as entered by the user and after domain validation

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Upper bound (inclusive) on `SibSp` and `Parch`
pub const MAX_RELATIVES: f64 = 10.0;
/// Upper bound (inclusive) on `Age`
pub const MAX_AGE: f64 = 100.0;
/// Upper bound (inclusive) on `Fare`
pub const MAX_FARE: f64 = 600.0;

/// Raw passenger attributes as collected from the user.
///
/// Field types are deliberately loose: numbers are read as `f64` and the
/// categorical fields as any JSON value, so that a fractional class count or
/// a non-string sex survives deserialization and is reported as
/// `InvalidInput`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPassengerRecord {
    /// Ticket class (1, 2 or 3)
    #[serde(rename = "Pclass", alias = "pclass")]
    pub pclass: f64,

    /// "male" or "female"
    #[serde(rename = "Sex", alias = "sex")]
    pub sex: Value,

    /// Age in years
    #[serde(rename = "Age", alias = "age")]
    pub age: f64,

    /// Siblings / spouses aboard
    #[serde(rename = "SibSp", alias = "sibsp", alias = "sib_sp")]
    pub sib_sp: f64,

    /// Parents / children aboard
    #[serde(rename = "Parch", alias = "parch")]
    pub parch: f64,

    /// Ticket fare
    #[serde(rename = "Fare", alias = "fare")]
    pub fare: f64,

    /// Port of embarkation ("C", "Q" or "S")
    #[serde(rename = "Embarked", alias = "embarked")]
    pub embarked: Value,
}

impl RawPassengerRecord {
    /// Create a record from its seven attributes
    pub fn new(
        pclass: i64,
        sex: &str,
        age: f64,
        sib_sp: i64,
        parch: i64,
        fare: f64,
        embarked: &str,
    ) -> Self {
        Self {
            pclass: pclass as f64,
            sex: Value::from(sex),
            age,
            sib_sp: sib_sp as f64,
            parch: parch as f64,
            fare,
            embarked: Value::from(embarked),
        }
    }

    /// Check every domain constraint and produce a typed passenger
    pub fn validate(&self) -> Result<Passenger, PredictionError> {
        Passenger::try_from(self)
    }
}

/// Ticket class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassengerClass {
    First,
    Second,
    Third,
}

impl PassengerClass {
    /// Only the exact values 1.0, 2.0 and 3.0 name a class
    pub fn from_number(n: f64) -> Option<Self> {
        if n == 1.0 {
            Some(Self::First)
        } else if n == 2.0 {
            Some(Self::Second)
        } else if n == 3.0 {
            Some(Self::Third)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Self::Male),
            "female" => Some(Self::Female),
            _ => None,
        }
    }
}

/// Port of embarkation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// Cherbourg
    Cherbourg,
    /// Queenstown
    Queenstown,
    /// Southampton
    Southampton,
}

impl Port {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "C" => Some(Self::Cherbourg),
            "Q" => Some(Self::Queenstown),
            "S" => Some(Self::Southampton),
            _ => None,
        }
    }
}

/// A passenger whose attributes all lie within their domains.
///
/// Only constructible through validation, so the feature encoder can be
/// total over it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Passenger {
    pclass: PassengerClass,
    sex: Sex,
    age: f64,
    sib_sp: u8,
    parch: u8,
    fare: f64,
    embarked: Port,
}

impl Passenger {
    pub fn pclass(&self) -> PassengerClass {
        self.pclass
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn sib_sp(&self) -> u8 {
        self.sib_sp
    }

    pub fn parch(&self) -> u8 {
        self.parch
    }

    pub fn fare(&self) -> f64 {
        self.fare
    }

    pub fn embarked(&self) -> Port {
        self.embarked
    }
}

fn invalid(field: &'static str, reason: impl fmt::Display) -> PredictionError {
    PredictionError::InvalidInput {
        field,
        reason: reason.to_string(),
    }
}

fn check_range(field: &'static str, value: f64, max: f64) -> Result<f64, PredictionError> {
    if !value.is_finite() {
        return Err(invalid(field, format!("{} is not a finite number", value)));
    }
    if !(0.0..=max).contains(&value) {
        return Err(invalid(field, format!("{} is outside [0, {}]", value, max)));
    }
    Ok(value)
}

fn check_count(field: &'static str, value: f64) -> Result<u8, PredictionError> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(invalid(field, format!("{} is not a whole number", value)));
    }
    if !(0.0..=MAX_RELATIVES).contains(&value) {
        return Err(invalid(
            field,
            format!("{} is outside [0, {}]", value, MAX_RELATIVES),
        ));
    }
    Ok(value as u8)
}

impl TryFrom<&RawPassengerRecord> for Passenger {
    type Error = PredictionError;

    fn try_from(raw: &RawPassengerRecord) -> Result<Self, Self::Error> {
        let pclass = PassengerClass::from_number(raw.pclass)
            .ok_or_else(|| invalid("Pclass", format!("{} is not one of 1, 2, 3", raw.pclass)))?;
        let sex = raw
            .sex
            .as_str()
            .and_then(Sex::parse)
            .ok_or_else(|| invalid("Sex", format!("{} is not \"male\" or \"female\"", raw.sex)))?;
        let age = check_range("Age", raw.age, MAX_AGE)?;
        let sib_sp = check_count("SibSp", raw.sib_sp)?;
        let parch = check_count("Parch", raw.parch)?;
        let fare = check_range("Fare", raw.fare, MAX_FARE)?;
        let embarked = raw
            .embarked
            .as_str()
            .and_then(Port::parse)
            .ok_or_else(|| {
                invalid(
                    "Embarked",
                    format!("{} is not one of \"C\", \"Q\", \"S\"", raw.embarked),
                )
            })?;

        Ok(Self {
            pclass,
            sex,
            age,
            sib_sp,
            parch,
            fare,
            embarked,
        })
    }
}

impl TryFrom<RawPassengerRecord> for Passenger {
    type Error = PredictionError;

    fn try_from(raw: RawPassengerRecord) -> Result<Self, Self::Error> {
        Passenger::try_from(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_record() -> RawPassengerRecord {
        RawPassengerRecord::new(3, "male", 22.0, 1, 0, 7.25, "S")
    }

    fn rejected_field(record: &RawPassengerRecord) -> &'static str {
        match record.validate() {
            Err(PredictionError::InvalidInput { field, .. }) => field,
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_record() {
        let passenger = valid_record().validate().unwrap();
        assert_eq!(passenger.pclass(), PassengerClass::Third);
        assert_eq!(passenger.sex(), Sex::Male);
        assert_eq!(passenger.sib_sp(), 1);
        assert_eq!(passenger.embarked(), Port::Southampton);
    }

    #[test]
    fn test_domain_edges_accepted() {
        let low = RawPassengerRecord::new(1, "female", 0.0, 0, 0, 0.0, "C");
        let high = RawPassengerRecord::new(2, "male", 100.0, 10, 10, 600.0, "Q");
        assert!(low.validate().is_ok());
        assert!(high.validate().is_ok());
    }

    #[test]
    fn test_invalid_pclass() {
        let mut record = valid_record();
        record.pclass = 4.0;
        assert_eq!(rejected_field(&record), "Pclass");
        record.pclass = 0.0;
        assert_eq!(rejected_field(&record), "Pclass");
        record.pclass = 1.5;
        assert_eq!(rejected_field(&record), "Pclass");
    }

    #[test]
    fn test_invalid_sex_is_case_sensitive() {
        let mut record = valid_record();
        record.sex = Value::from("Male");
        assert_eq!(rejected_field(&record), "Sex");
    }

    #[test]
    fn test_invalid_numeric_fields() {
        let mut record = valid_record();
        record.age = 100.5;
        assert_eq!(rejected_field(&record), "Age");

        let mut record = valid_record();
        record.age = f64::NAN;
        assert_eq!(rejected_field(&record), "Age");

        let mut record = valid_record();
        record.sib_sp = -1.0;
        assert_eq!(rejected_field(&record), "SibSp");

        let mut record = valid_record();
        record.parch = 11.0;
        assert_eq!(rejected_field(&record), "Parch");

        let mut record = valid_record();
        record.fare = 600.01;
        assert_eq!(rejected_field(&record), "Fare");
    }

    #[test]
    fn test_fractional_counts_rejected() {
        let mut record = valid_record();
        record.sib_sp = 2.5;
        assert_eq!(rejected_field(&record), "SibSp");

        let mut record = valid_record();
        record.parch = 0.1;
        assert_eq!(rejected_field(&record), "Parch");
    }

    #[test]
    fn test_mistyped_values_reach_validation() {
        let json = r#"{"Pclass":1.5,"Sex":"female","Age":38,"SibSp":1,"Parch":0,"Fare":71.28,"Embarked":"C"}"#;
        let record: RawPassengerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rejected_field(&record), "Pclass");

        let json = r#"{"Pclass":1,"Sex":1,"Age":38,"SibSp":1,"Parch":0,"Fare":71.28,"Embarked":"C"}"#;
        let record: RawPassengerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rejected_field(&record), "Sex");

        let json = r#"{"Pclass":1,"Sex":"female","Age":38,"SibSp":1,"Parch":0,"Fare":71.28,"Embarked":null}"#;
        let record: RawPassengerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rejected_field(&record), "Embarked");
    }

    #[test]
    fn test_invalid_embarked() {
        let mut record = valid_record();
        record.embarked = Value::from("X");
        assert_eq!(rejected_field(&record), "Embarked");
    }

    #[test]
    fn test_deserialize_original_column_names() {
        let json = r#"{"Pclass":1,"Sex":"female","Age":38,"SibSp":1,"Parch":0,"Fare":71.28,"Embarked":"C"}"#;
        let record: RawPassengerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.pclass, 1.0);
        assert_eq!(record.age, 38.0);
        assert_eq!(record.embarked, "C");
    }

    #[test]
    fn test_deserialize_snake_case_aliases() {
        let json = r#"{"pclass":2,"sex":"male","age":30.5,"sib_sp":0,"parch":2,"fare":13.0,"embarked":"Q"}"#;
        let record: RawPassengerRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.sib_sp, 0.0);
        assert_eq!(record.parch, 2.0);
    }
}
