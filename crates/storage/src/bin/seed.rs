use std::fmt;

use lms_core::model::{
    Course, CourseId, EntityId, LessonId, Section, SectionId, SubjectId, Syllabus, fact::keys,
};
use storage::sqlite::SqliteStore;
use storage::store::{CourseRepository, FactStore};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    course_id: CourseId,
    course_title: String,
    subject_id: SubjectId,
    completed: u32,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidCourseId { raw: String },
    InvalidSubjectId { raw: String },
    InvalidCompleted { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCourseId { raw } => write!(f, "invalid --course-id value: {raw}"),
            ArgsError::InvalidSubjectId { raw } => write!(f, "invalid --subject-id value: {raw}"),
            ArgsError::InvalidCompleted { raw } => write!(f, "invalid --completed value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("LMS_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut course_id = std::env::var("LMS_COURSE_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| CourseId::new(1), CourseId::new);
        let mut course_title =
            std::env::var("LMS_COURSE_TITLE").unwrap_or_else(|_| "Pottery Basics".into());
        let mut subject_id = std::env::var("LMS_SUBJECT_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| SubjectId::new(1), SubjectId::new);
        let mut completed = std::env::var("LMS_COMPLETED")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(1);

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--course-id" => {
                    let value = require_value(&mut args, "--course-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCourseId { raw: value.clone() })?;
                    course_id = CourseId::new(parsed);
                }
                "--course-title" => {
                    course_title = require_value(&mut args, "--course-title")?;
                }
                "--subject-id" => {
                    let value = require_value(&mut args, "--subject-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSubjectId { raw: value.clone() })?;
                    subject_id = SubjectId::new(parsed);
                }
                "--completed" => {
                    let value = require_value(&mut args, "--completed")?;
                    completed = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidCompleted { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            course_id,
            course_title,
            subject_id,
            completed,
        })
    }
}

/// Demo section and lesson ids live in a thousand-wide block above the
/// course id; `None` when the course id is too large to carry one.
fn demo_id_base(course_id: CourseId) -> Option<u64> {
    course_id.value().checked_mul(1_000)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --course-id <id>          Course id to upsert (default: 1)");
    eprintln!("  --course-title <name>     Course title (default: Pottery Basics)");
    eprintln!("  --subject-id <id>         Subject to enroll (default: 1)");
    eprintln!("  --completed <n>           Lessons to mark complete (default: 1)");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  LMS_DB_URL, LMS_COURSE_ID, LMS_COURSE_TITLE, LMS_SUBJECT_ID, LMS_COMPLETED");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let store = SqliteStore::connect(&args.db_url).await?;
    store.migrate().await?;

    let base = demo_id_base(args.course_id)
        .ok_or("course id too large to derive demo section and lesson ids")?;
    let sections = vec![
        Section::new(
            SectionId::new(base + 10),
            vec![LessonId::new(base + 101), LessonId::new(base + 102)],
        ),
        Section::new(
            SectionId::new(base + 20),
            vec![LessonId::new(base + 201), LessonId::new(base + 202)],
        ),
    ];
    let syllabus = Syllabus::new(sections)?;
    let lesson_ids = syllabus.all_lesson_ids();

    let course = Course::new(args.course_id, args.course_title.clone(), syllabus)?
        .with_short_description("Seeded demo course")
        .with_difficulty("Beginner");
    store.upsert_course(&course).await?;

    for section in course.syllabus().sections() {
        store
            .set_title(
                EntityId::from(section.id()),
                &format!("Section {}", section.id()),
            )
            .await?;
        for lesson in section.lessons() {
            store
                .set_title(EntityId::from(*lesson), &format!("Lesson {lesson}"))
                .await?;
        }
    }

    store
        .put_fact(
            args.subject_id,
            EntityId::from(course.id()),
            keys::STATUS,
            "Enrolled",
        )
        .await?;
    store
        .put_fact(
            args.subject_id,
            EntityId::from(course.id()),
            keys::START_DATE,
            "",
        )
        .await?;

    let completed = (args.completed as usize).min(lesson_ids.len());
    for lesson in lesson_ids.iter().take(completed) {
        store
            .put_fact(
                args.subject_id,
                EntityId::from(*lesson),
                keys::IS_COMPLETE,
                "yes",
            )
            .await?;
    }

    println!(
        "Seeded course {} ({} lessons) with subject {} enrolled and {} lessons complete into {}",
        course.id().value(),
        lesson_ids.len(),
        args.subject_id.value(),
        completed,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_id_base_guards_against_overflow() {
        assert_eq!(demo_id_base(CourseId::new(1)), Some(1_000));
        assert_eq!(demo_id_base(CourseId::new(u64::MAX)), None);
    }
}
