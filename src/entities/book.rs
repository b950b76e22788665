// 📖 Book Entity - a publication read page by page
//
// total_pages is fixed at creation; pages_read only grows through `read`.

use super::publication::{Publication, PublicationField, PublicationFields, PublicationRegistry};
use super::round2;
use crate::audit::AuditLog;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue, SYSTEM_ACTOR};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookField {
    Id,
    Title,
    Year,
    TotalPages,
    PagesRead,
}

impl EntityField for BookField {
    const ENTITY: &'static str = "book";

    fn definition(self) -> FieldDefinition {
        match self {
            BookField::Id => PublicationField::Id.definition(),
            BookField::Title => PublicationField::Title.definition(),
            BookField::Year => PublicationField::Year.definition(),
            BookField::TotalPages => FieldDefinition::new(FieldType::Integer)
                .with_rules(&[ValidationRule::Positive])
                .with_description("Page count, fixed at creation"),
            BookField::PagesRead => FieldDefinition::new(FieldType::Integer)
                .controlled_by("read")
                .with_rules(&[ValidationRule::NonNegative]),
        }
    }
}

impl PublicationFields for BookField {
    const ID: Self = BookField::Id;
    const TITLE: Self = BookField::Title;
    const YEAR: Self = BookField::Year;
}

/// One accepted call to `read`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingSession {
    pub timestamp: DateTime<Utc>,
    pub pages: u32,
    pub accumulated: u32,
}

#[derive(Debug)]
pub struct Book {
    publication: Publication<BookField>,
    total_pages: u32,
    pages_read: u32,
    sessions: Vec<ReadingSession>,
}

impl Book {
    pub fn new(
        registry: &PublicationRegistry,
        id: u32,
        title: &str,
        year: i32,
        total_pages: u32,
    ) -> EntityResult<Self> {
        BookField::TotalPages.check(&total_pages.into())?;

        let extra = vec![
            (BookField::TotalPages, FieldValue::from(total_pages)),
            (BookField::PagesRead, FieldValue::from(0_u32)),
        ];
        let publication = Publication::build(registry, id, title, year, extra)?;

        Ok(Book {
            publication,
            total_pages,
            pages_read: 0,
            sessions: Vec::new(),
        })
    }

    pub fn publication(&self) -> &Publication<BookField> {
        &self.publication
    }

    pub fn title(&self) -> &str {
        self.publication.title()
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn pages_read(&self) -> u32 {
        self.pages_read
    }

    pub fn remaining_pages(&self) -> u32 {
        self.total_pages - self.pages_read
    }

    pub fn is_finished(&self) -> bool {
        self.pages_read >= self.total_pages
    }

    /// Percentage read, 2 decimals
    pub fn progress(&self) -> f64 {
        round2(f64::from(self.pages_read) / f64::from(self.total_pages) * 100.0)
    }

    pub fn reading_sessions(&self) -> Vec<ReadingSession> {
        self.sessions.clone()
    }

    pub fn audit_log(&self) -> AuditLog<BookField> {
        self.publication.audit_log()
    }

    pub fn update_title(&mut self, title: &str) -> EntityResult<()> {
        self.publication.update_title(title)
    }

    pub fn update_year(&mut self, year: i32) -> EntityResult<()> {
        self.publication.update_year(year)
    }

    /// Record `pages` more pages read
    pub fn read(&mut self, pages: u32) -> EntityResult<()> {
        if pages == 0 {
            return Err(EntityError::validation(
                BookField::ENTITY,
                BookField::PagesRead.name(),
                "must read at least one page",
            )
            .logged());
        }
        if self.is_finished() {
            return Err(EntityError::state(
                BookField::ENTITY,
                format!("book {} is already finished", self.publication.id()),
            )
            .logged());
        }

        let remaining = self.remaining_pages();
        if pages > remaining {
            return Err(EntityError::validation(
                BookField::ENTITY,
                BookField::PagesRead.name(),
                format!("cannot read {} pages, only {} remain", pages, remaining),
            )
            .logged());
        }

        let before = self.pages_read;
        self.pages_read += pages;
        self.publication.record_event(
            SYSTEM_ACTOR,
            EventKind::FieldUpdate {
                field: BookField::PagesRead,
                before: before.into(),
                after: self.pages_read.into(),
            },
            Some(format!("read {} pages", pages)),
        );
        self.sessions.push(ReadingSession {
            timestamp: Utc::now(),
            pages,
            accumulated: self.pages_read,
        });

        tracing::info!(
            book = self.publication.id(),
            pages,
            progress = self.progress(),
            "reading recorded"
        );
        if self.is_finished() {
            tracing::info!(book = self.publication.id(), "book finished");
        }
        Ok(())
    }
}

impl Entity for Book {
    type Id = u32;
    type Field = BookField;

    fn id(&self) -> &u32 {
        self.publication.id_ref()
    }

    fn history(&self) -> Vec<Event<BookField>> {
        self.publication.snapshot()
    }

    fn read_field(&self, field: BookField) -> FieldValue {
        match field {
            BookField::Id => self.publication.id().into(),
            BookField::Title => self.publication.title().into(),
            BookField::Year => self.publication.year().into(),
            BookField::TotalPages => self.total_pages.into(),
            BookField::PagesRead => self.pages_read.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
