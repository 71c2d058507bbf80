use super::*;
use regex::Regex;
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

pub const DEFAULT_ICON: &str = "book";
pub const DEFAULT_COLOR: &str = "#4F46E5";

/// Keyword, icon, color. The first keyword found in the subject name wins.
const SUBJECT_STYLES: &[(&str, &str, &str)] = &[
    ("数学", "calculator", "#3B82F6"),
    ("物理", "atom", "#8B5CF6"),
    ("化学", "flask", "#10B981"),
    ("生物", "dna", "#22C55E"),
    ("历史", "landmark", "#F59E0B"),
    ("地理", "globe", "#06B6D4"),
    ("英语", "languages", "#EF4444"),
    ("语文", "book-open", "#EC4899"),
];

lazy_static! {
    static ref COLOR_FORMAT: Regex = Regex::new("^#[0-9a-fA-F]{6}$")
        .expect("The color pattern is a valid regex.");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubjectStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

pub fn style_for(name: &str) -> SubjectStyle {
    let normalized = name.nfkc().collect::<String>().to_lowercase();
    SUBJECT_STYLES.iter()
        .find(|&&(keyword, _, _)| normalized.contains(keyword))
        .map(|&(_, icon, color)| SubjectStyle { icon, color })
        .unwrap_or(SubjectStyle { icon: DEFAULT_ICON, color: DEFAULT_COLOR })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubjectForm {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubject {
    pub name: String,
    pub color: String,
    pub icon: String,
}

impl SubjectForm {
    pub fn validate(self) -> Result<ValidSubject> {
        let name = self.name.map(|n| n.trim().to_string()).unwrap_or_default();
        if name.is_empty() {
            bail!(ErrorKind::InvalidInput("name is required".into()));
        }
        if let Some(ref color) = self.color {
            if !COLOR_FORMAT.is_match(color) {
                bail!(ErrorKind::InvalidInput(format!("color {:?} is not of the form #RRGGBB", color)));
            }
        }
        let style = style_for(&name);
        Ok(ValidSubject {
            color: self.color.unwrap_or_else(|| style.color.to_string()),
            icon: self.icon.filter(|i| !i.trim().is_empty()).unwrap_or_else(|| style.icon.to_string()),
            name,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    #[serde(flatten)]
    pub subject: Subject,
    pub question_count: i64,
    pub mastered_count: i64,
}

pub fn get(conn: &PgConnection, user_id: i32, subject_id: i32) -> Result<Option<Subject>> {
    use crate::schema::subjects;

    let subject = subjects::table
        .filter(subjects::id.eq(subject_id))
        .filter(subjects::user_id.eq(user_id))
        .get_result(conn)
        .optional()?;

    Ok(subject)
}

pub fn all(conn: &PgConnection, user_id: i32) -> Result<Vec<Subject>> {
    use crate::schema::subjects;

    let subjects = subjects::table
        .filter(subjects::user_id.eq(user_id))
        .order((subjects::name.asc(), subjects::id.asc()))
        .load(conn)?;

    Ok(subjects)
}

pub fn list(conn: &PgConnection, user_id: i32) -> Result<Vec<SubjectSummary>> {
    use crate::schema::questions;

    let subjects = all(conn, user_id)?;

    let statuses: Vec<(i32, String)> = questions::table
        .filter(questions::user_id.eq(user_id))
        .select((questions::subject_id, questions::status))
        .load(conn)?;

    let mut counts: HashMap<i32, (i64, i64)> = HashMap::new();
    for (subject_id, status) in &statuses {
        let entry = counts.entry(*subject_id).or_insert((0, 0));
        entry.0 += 1;
        if is_mastered(status) {
            entry.1 += 1;
        }
    }

    Ok(subjects.into_iter()
        .map(|subject| {
            let (question_count, mastered_count) = counts.get(&subject.id).cloned().unwrap_or((0, 0));
            SubjectSummary { subject, question_count, mastered_count }
        })
        .collect())
}

pub fn create(conn: &PgConnection, user_id: i32, subject: &ValidSubject) -> Result<Subject> {
    use crate::schema::subjects;

    let new_subject = NewSubject {
        user_id,
        name: &subject.name,
        color: &subject.color,
        icon: &subject.icon,
    };

    let subject: Subject = diesel::insert_into(subjects::table)
        .values(&new_subject)
        .get_result(conn)
        .chain_err(|| "Couldn't create a new subject!")?;

    info!("User {} created subject {:?}", user_id, subject.name);
    Ok(subject)
}

#[test]
fn test_style_keywords() {
    assert_eq!(style_for("高中数学"), SubjectStyle { icon: "calculator", color: "#3B82F6" });
    assert_eq!(style_for("英语听力"), SubjectStyle { icon: "languages", color: "#EF4444" });
    assert_eq!(style_for("语文"), SubjectStyle { icon: "book-open", color: "#EC4899" });
    assert_eq!(style_for("Music"), SubjectStyle { icon: DEFAULT_ICON, color: DEFAULT_COLOR });
    assert_eq!(style_for(""), SubjectStyle { icon: DEFAULT_ICON, color: DEFAULT_COLOR });
}

#[test]
fn test_style_first_match_wins() {
    // "数学" comes before "物理" in the table
    assert_eq!(style_for("物理与数学").icon, "calculator");
}

#[test]
fn test_subject_form_validation() {
    let valid = SubjectForm { name: Some("  化学 ".into()), color: None, icon: None }
        .validate()
        .unwrap();
    assert_eq!(valid, ValidSubject { name: "化学".into(), color: "#10B981".into(), icon: "flask".into() });

    let custom = SubjectForm { name: Some("Art".into()), color: Some("#aabbcc".into()), icon: Some("palette".into()) }
        .validate()
        .unwrap();
    assert_eq!(custom.color, "#aabbcc");
    assert_eq!(custom.icon, "palette");

    assert!(SubjectForm { name: None, color: None, icon: None }.validate().is_err());
    assert!(SubjectForm { name: Some("   ".into()), color: None, icon: None }.validate().is_err());
    let bad_color = SubjectForm { name: Some("Art".into()), color: Some("red".into()), icon: None }.validate();
    match bad_color {
        Err(Error(ErrorKind::InvalidInput(_), _)) => (),
        other => panic!("Expected InvalidInput, got {:?}", other),
    }
}
