// 📚 Publication Entity - titled work with a printing year
//
// Base for Book. The struct is generic over its field enum so that a derived entity
// shares this log: its extra fields live in the same enum and are recorded through
// `record_event`.

use crate::audit::AuditLog;
use crate::entity::Entity;
use crate::error::{EntityError, EntityResult};
use crate::event::{Event, EventKind, FieldValue, SYSTEM_ACTOR};
use crate::field::{EntityField, FieldDefinition, FieldType, ValidationRule};
use crate::registry::IdRegistry;
use serde::Serialize;
use strum::{EnumIter, IntoStaticStr};

/// Publication numbers already in use (books included)
pub type PublicationRegistry = IdRegistry<u32>;

/// First year of movable-type printing accepted as a publication year
pub const MIN_YEAR: i32 = 1450;

const YEAR_RULES: &[ValidationRule] = &[ValidationRule::AtLeast(MIN_YEAR as f64)];

// ============================================================================
// PUBLICATION FIELDS
// ============================================================================

/// Field enums that carry the publication's own fields
pub trait PublicationFields: EntityField {
    const ID: Self;
    const TITLE: Self;
    const YEAR: Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PublicationField {
    Id,
    Title,
    Year,
}

impl EntityField for PublicationField {
    const ENTITY: &'static str = "publication";

    fn definition(self) -> FieldDefinition {
        match self {
            PublicationField::Id => FieldDefinition::new(FieldType::Identifier)
                .with_rules(&[ValidationRule::Positive]),
            PublicationField::Title => FieldDefinition::new(FieldType::Text)
                .controlled_by("update_title")
                .with_rules(&[ValidationRule::NonEmpty]),
            PublicationField::Year => FieldDefinition::new(FieldType::Integer)
                .controlled_by("update_year")
                .with_rules(YEAR_RULES)
                .with_description("Year of publication, 1450 or later"),
        }
    }
}

impl PublicationFields for PublicationField {
    const ID: Self = PublicationField::Id;
    const TITLE: Self = PublicationField::Title;
    const YEAR: Self = PublicationField::Year;
}

// ============================================================================
// PUBLICATION ENTITY
// ============================================================================

#[derive(Debug)]
pub struct Publication<F = PublicationField> {
    id: u32,
    title: String,
    year: i32,
    log: AuditLog<F>,
}

impl Publication<PublicationField> {
    pub fn new(registry: &PublicationRegistry, id: u32, title: &str, year: i32) -> EntityResult<Self> {
        Self::build(registry, id, title, year, Vec::new())
    }
}

impl<F: PublicationFields> Publication<F> {
    /// Validate, claim the id, and record creation with `extra` appended to the snapshot.
    ///
    /// Callers validate their extra fields before calling, so nothing is claimed on failure.
    pub(crate) fn build(
        registry: &PublicationRegistry,
        id: u32,
        title: &str,
        year: i32,
        extra: Vec<(F, FieldValue)>,
    ) -> EntityResult<Self> {
        let title = title.trim();
        F::ID.check(&id.into())?;
        F::TITLE.check(&title.into())?;
        F::YEAR.check(&year.into())?;

        if !registry.claim(id) {
            return Err(EntityError::validation(
                F::ENTITY,
                F::ID.name(),
                format!("publication {} is already registered", id),
            )
            .logged());
        }

        let mut publication = Publication {
            id,
            title: title.to_string(),
            year,
            log: AuditLog::new(id.to_string()),
        };

        let mut snapshot = vec![
            (F::ID, FieldValue::from(id)),
            (F::TITLE, FieldValue::from(title)),
            (F::YEAR, FieldValue::from(year)),
        ];
        snapshot.extend(extra);
        publication.record_event(SYSTEM_ACTOR, EventKind::Created { snapshot }, None);

        tracing::info!(entity = F::ENTITY, id, title, year, "publication registered");
        Ok(publication)
    }

    /// Append to the shared log (used by derived entities for their own fields)
    pub(crate) fn record_event(&mut self, actor: &str, kind: EventKind<F>, detail: Option<String>) {
        self.log.record(actor, kind, detail);
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn audit_log(&self) -> AuditLog<F> {
        self.log.clone()
    }

    pub fn update_title(&mut self, title: &str) -> EntityResult<()> {
        let title = title.trim();
        F::TITLE.check(&title.into())?;

        let before = std::mem::replace(&mut self.title, title.to_string());
        self.record_event(
            SYSTEM_ACTOR,
            EventKind::FieldUpdate {
                field: F::TITLE,
                before: before.into(),
                after: title.into(),
            },
            None,
        );
        Ok(())
    }

    pub fn update_year(&mut self, year: i32) -> EntityResult<()> {
        F::YEAR.check(&year.into())?;

        let before = std::mem::replace(&mut self.year, year);
        self.record_event(
            SYSTEM_ACTOR,
            EventKind::FieldUpdate {
                field: F::YEAR,
                before: before.into(),
                after: year.into(),
            },
            None,
        );
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Vec<Event<F>> {
        self.log.snapshot()
    }

    pub(crate) fn id_ref(&self) -> &u32 {
        &self.id
    }
}

impl Entity for Publication<PublicationField> {
    type Id = u32;
    type Field = PublicationField;

    fn id(&self) -> &u32 {
        &self.id
    }

    fn history(&self) -> Vec<Event<PublicationField>> {
        self.log.snapshot()
    }

    fn read_field(&self, field: PublicationField) -> FieldValue {
        match field {
            PublicationField::Id => self.id.into(),
            PublicationField::Title => (&self.title).into(),
            PublicationField::Year => self.year.into(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CapabilityReason;
    use crate::event::EventTag;

    #[test]
    fn test_new_publication() {
        let registry = PublicationRegistry::new();
        let publication = Publication::new(&registry, 1, "Don Quijote", 1605).unwrap();

        assert_eq!(publication.title(), "Don Quijote");
        assert_eq!(publication.year(), 1605);
        assert_eq!(publication.history()[0].tag(), EventTag::Creation);
    }

    #[test]
    fn test_construction_rules() {
        let registry = PublicationRegistry::new();

        assert!(Publication::new(&registry, 0, "Título", 1605).is_err());
        assert!(Publication::new(&registry, 1, "  ", 1605).is_err());
        assert!(Publication::new(&registry, 1, "Incunable", 1449).is_err());
        assert!(registry.is_empty());

        assert!(Publication::new(&registry, 1, "Gutenberg", MIN_YEAR).is_ok());
        assert!(Publication::new(&registry, 1, "Otra", 1900).unwrap_err().is_validation());
    }

    #[test]
    fn test_titles_are_trimmed() {
        let registry = PublicationRegistry::new();
        let mut publication = Publication::new(&registry, 1, "  Don Quijote ", 1605).unwrap();
        assert_eq!(publication.title(), "Don Quijote");

        publication.update_title(" El ingenioso hidalgo\t").unwrap();
        assert_eq!(publication.title(), "El ingenioso hidalgo");
        let last = publication.audit_log().last().unwrap();
        assert_eq!(last.after(), Some(FieldValue::from("El ingenioso hidalgo")));

        assert!(publication.update_title("   ").unwrap_err().is_validation());
        assert_eq!(publication.title(), "El ingenioso hidalgo");
    }

    #[test]
    fn test_updates_record_field_and_values() {
        let registry = PublicationRegistry::new();
        let mut publication = Publication::new(&registry, 1, "Don Quijote", 1605).unwrap();

        publication.update_title("El ingenioso hidalgo").unwrap();
        publication.update_year(1615).unwrap();

        let log = publication.audit_log();
        assert_eq!(log.count_tag(EventTag::FieldUpdate), 2);
        assert_eq!(log.for_field(PublicationField::Year)[0].before(), Some(FieldValue::from(1605)));

        assert!(publication.update_title("").unwrap_err().is_validation());
        assert!(publication.update_year(1200).unwrap_err().is_validation());
        assert_eq!(publication.year(), 1615);
        assert_eq!(publication.history().len(), 3);
    }

    #[test]
    fn test_title_not_assignable() {
        let registry = PublicationRegistry::new();
        let mut publication = Publication::new(&registry, 1, "Don Quijote", 1605).unwrap();

        let err = publication.assign("title", FieldValue::from("Otro")).unwrap_err();
        assert!(matches!(
            err,
            EntityError::Capability {
                reason: CapabilityReason::Controlled { operation: "update_title" },
                ..
            }
        ));
        assert_eq!(publication.title(), "Don Quijote");
    }
}
