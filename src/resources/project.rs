use serde::{Deserialize, Serialize};

use super::{validate_url, Resource, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub title: String,
    pub date: String,
    pub summary: String,
    pub stack: Vec<String>,
    pub github: String,
    pub demo: String,
    pub image: Option<String>,
}

/// Query parameters accepted by `POST /project` and `PATCH /project`.
/// `stack` is a comma-delimited list such as `"react, node"`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectForm {
    pub title: String,
    pub date: String,
    pub summary: String,
    pub stack: String,
    pub github: String,
    pub demo: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl Resource for Project {
    const NAME: &'static str = "project";
    type Form = ProjectForm;

    fn from_form(form: ProjectForm) -> Result<Self, ValidationError> {
        Ok(Self {
            title: form.title,
            date: form.date,
            summary: form.summary,
            stack: normalize_stack(&form.stack),
            github: validate_url("github", &form.github)?,
            demo: validate_url("demo", &form.demo)?,
            image: form.image.filter(|image| !image.trim().is_empty()),
        })
    }
}

/// Split a delimited stack string into trimmed, non-empty tokens, keeping order
pub fn normalize_stack(stack: &str) -> Vec<String> {
    stack
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_is_trimmed_and_ordered() {
        assert_eq!(normalize_stack("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(normalize_stack("react, node"), vec!["react", "node"]);
    }

    #[test]
    fn stack_drops_empty_tokens() {
        assert_eq!(normalize_stack(" go,, rust , "), vec!["go", "rust"]);
        assert!(normalize_stack("").is_empty());
        assert!(normalize_stack(" , ,").is_empty());
    }

    #[test]
    fn from_form_normalizes_and_validates_links() {
        let form = ProjectForm {
            title: "X".to_string(),
            date: "2023-01".to_string(),
            summary: "a thing".to_string(),
            stack: "go, rust".to_string(),
            github: "https://github.com/alice/x".to_string(),
            demo: "https://x.example.com".to_string(),
            image: Some(String::new()),
        };

        let project = Project::from_form(form.clone()).unwrap();
        assert_eq!(project.stack, vec!["go", "rust"]);
        assert_eq!(project.image, None);

        let err = Project::from_form(ProjectForm {
            demo: "x.example.com".to_string(),
            ..form
        })
        .unwrap_err();
        assert_eq!(err.field, "demo");
    }
}
