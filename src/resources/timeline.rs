use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{Resource, ValidationError};

/// Timeline category. Anything other than these two tags is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActType {
    Edu,
    Work,
}

impl FromStr for ActType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "edu" => Ok(ActType::Edu),
            "work" => Ok(ActType::Work),
            other => Err(ValidationError::new(
                "acttype",
                format!("expected 'edu' or 'work', got '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub title: String,
    pub description: String,
    pub place: String,
    #[serde(rename = "type")]
    pub act_type: ActType,
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
    pub date: Option<String>,
}

/// Query parameters accepted by `POST /timeline` and `PATCH /timeline`
#[derive(Debug, Clone, Deserialize)]
pub struct TimelineForm {
    pub title: String,
    pub description: String,
    pub place: String,
    pub acttype: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default, alias = "date_")]
    pub date: Option<String>,
}

impl Resource for Timeline {
    const NAME: &'static str = "timeline";
    type Form = TimelineForm;

    fn from_form(form: TimelineForm) -> Result<Self, ValidationError> {
        Ok(Self {
            title: form.title,
            description: form.description,
            place: form.place,
            act_type: form.acttype.trim().parse()?,
            start_date: form.start_date,
            end_date: form.end_date,
            date: form.date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn acttype_is_closed() {
        assert_eq!("edu".parse::<ActType>().unwrap(), ActType::Edu);
        assert_eq!("work".parse::<ActType>().unwrap(), ActType::Work);
        assert!("school".parse::<ActType>().is_err());
        assert!("Work".parse::<ActType>().is_err());
    }

    #[test]
    fn form_rejects_unknown_acttype() {
        let form: TimelineForm = serde_json::from_value(json!({
            "title": "BSc",
            "description": "Computer science",
            "place": "Somewhere",
            "acttype": "hobby"
        }))
        .unwrap();

        let err = Timeline::from_form(form).unwrap_err();
        assert_eq!(err.field, "acttype");
        assert!(err.message.contains("hobby"));
    }

    #[test]
    fn stored_shape_uses_wire_names() {
        let form: TimelineForm = serde_json::from_value(json!({
            "title": "Engineer",
            "description": "Backend",
            "place": "Acme",
            "acttype": "work",
            "start_date": "2020",
            "date_": "2020-2022"
        }))
        .unwrap();

        let stored = serde_json::to_value(Timeline::from_form(form).unwrap()).unwrap();
        assert_eq!(stored["type"], "work");
        assert_eq!(stored["startDate"], "2020");
        assert_eq!(stored["endDate"], serde_json::Value::Null);
        assert_eq!(stored["date"], "2020-2022");
    }
}
