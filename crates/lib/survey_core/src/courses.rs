//! Course catalog for the course-number suggestions.
//!
//! `courses.csv` has a header row and `code,name` records. Names may be
//! quoted and span several lines, and some carry a trailing `CR` marker.

/// One course suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub code: String,
    pub name: String,
}

impl Course {
    /// Suggestion text, `"CODE - Name"`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

/// Parse the catalog. Records without a comma are skipped.
pub fn parse_courses(csv: &str) -> Vec<Course> {
    let mut records: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut in_quotes = false;

    for line in csv.split('\n') {
        let odd_quotes = line.matches('"').count() % 2 != 0;
        if in_quotes {
            buffer.push('\n');
            buffer.push_str(line);
            if odd_quotes {
                in_quotes = false;
                records.push(std::mem::take(&mut buffer));
            }
        } else if odd_quotes {
            buffer = line.to_string();
            in_quotes = true;
        } else {
            records.push(line.to_string());
        }
    }

    records
        .into_iter()
        .skip(1)
        .filter_map(|record| {
            let (code, name) = record.split_once(',')?;
            let name = name.replace('\r', "");
            let name = name.strip_suffix("CR").unwrap_or(&name);
            let name = name.trim_matches('"').trim();
            Some(Course {
                code: code.trim().to_string(),
                name: name.to_string(),
            })
        })
        .filter(|c| !c.code.is_empty())
        .collect()
}
