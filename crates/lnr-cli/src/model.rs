use crate::output::{or_dash, truncate, Row};
use serde::{Deserialize, Serialize};

const TITLE_WIDTH: usize = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Named {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRef {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub name: String,
    #[serde(default)]
    pub url_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub organization: Organization,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub key: String,
    pub name: String,
}

impl Row for Team {
    const HEADERS: &'static [&'static str] = &["KEY", "NAME", "ID"];
    fn cells(&self) -> Vec<String> {
        vec![self.key.clone(), self.name.clone(), self.id.clone()]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl Row for User {
    const HEADERS: &'static [&'static str] = &["NAME", "DISPLAY", "EMAIL", "ACTIVE"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(self.display_name.as_deref()),
            or_dash(self.email.as_deref()),
            if self.active { "yes" } else { "no" }.to_string(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub team: Option<TeamRef>,
}

impl Row for Label {
    const HEADERS: &'static [&'static str] = &["NAME", "COLOR", "TEAM", "ID"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            or_dash(self.color.as_deref()),
            self.team.as_ref().map_or_else(|| "(workspace)".to_string(), |t| t.key.clone()),
            self.id.clone(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub target_date: Option<String>,
}

impl Row for Project {
    const HEADERS: &'static [&'static str] = &["NAME", "STATE", "PROGRESS", "TARGET", "ID"];
    fn cells(&self) -> Vec<String> {
        vec![
            truncate(&self.name, TITLE_WIDTH),
            or_dash(self.state.as_deref()),
            self.progress
                .map_or_else(|| "-".to_string(), |p| format!("{:.0}%", p * 100.0)),
            or_dash(self.target_date.as_deref()),
            self.id.clone(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub state: Option<Named>,
    #[serde(default)]
    pub assignee: Option<Named>,
    #[serde(default)]
    pub team: Option<TeamRef>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Issue {
    pub fn priority_label(&self) -> &'static str {
        match self.priority.map(|p| p.round() as i64) {
            Some(1) => "urgent",
            Some(2) => "high",
            Some(3) => "medium",
            Some(4) => "low",
            _ => "none",
        }
    }
}

impl Row for Issue {
    const HEADERS: &'static [&'static str] = &["ID", "STATE", "PRIORITY", "ASSIGNEE", "TITLE"];
    fn cells(&self) -> Vec<String> {
        vec![
            self.identifier.clone(),
            or_dash(self.state.as_ref().map(|s| s.name.as_str())),
            self.priority_label().to_string(),
            or_dash(self.assignee.as_ref().map(|a| a.name.as_str())),
            truncate(&self.title, TITLE_WIDTH),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub created_at: String,
    #[serde(default)]
    pub user: Option<Named>,
}

impl Row for Comment {
    const HEADERS: &'static [&'static str] = &["CREATED", "AUTHOR", "BODY"];
    fn cells(&self) -> Vec<String> {
        let first_line = self.body.lines().next().unwrap_or_default();
        vec![
            self.created_at.clone(),
            or_dash(self.user.as_ref().map(|u| u.name.as_str())),
            truncate(first_line, TITLE_WIDTH),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn issue_deserializes_from_api_shape() {
        let issue: Issue = serde_json::from_value(json!({
            "id": "abc",
            "identifier": "ENG-1",
            "title": "Fix login",
            "priority": 2.0,
            "state": {"name": "In Progress"},
            "assignee": null,
            "updatedAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            issue.cells(),
            vec!["ENG-1", "In Progress", "high", "-", "Fix login"]
        );
    }

    #[test]
    fn row_width_matches_headers() {
        let team = Team {
            id: "t".into(),
            key: "ENG".into(),
            name: "Engineering".into(),
        };
        assert_eq!(team.cells().len(), Team::HEADERS.len());
        let label = Label {
            id: "l".into(),
            name: "bug".into(),
            color: None,
            team: None,
        };
        assert_eq!(label.cells().len(), Label::HEADERS.len());
        assert_eq!(label.cells()[2], "(workspace)");
    }

    #[test]
    fn project_progress_is_a_percentage() {
        let project: Project = serde_json::from_value(json!({
            "id": "p", "name": "Roadmap", "state": "started", "progress": 0.25
        }))
        .unwrap();
        assert_eq!(project.cells()[2], "25%");
    }
}
