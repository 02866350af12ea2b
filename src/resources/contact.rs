use serde::{Deserialize, Serialize};

use super::{validate_url, Resource, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub label: String,
    pub link: Option<String>,
}

/// Query parameters accepted by `POST /contact` and `PATCH /contact`
#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl Resource for Contact {
    const NAME: &'static str = "contact";
    type Form = ContactForm;

    fn from_form(form: ContactForm) -> Result<Self, ValidationError> {
        let link = match form.link.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(link) => Some(validate_url("link", link)?),
        };

        Ok(Self {
            name: form.name,
            label: form.label,
            link,
        })
    }
}
