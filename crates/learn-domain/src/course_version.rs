// course_version.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Instantánea inmutable del contenido de un curso.
///
/// Cada versión pertenece a exactamente un curso y lleva un número
/// monotónicamente creciente (único por curso). Una vez creada sólo cambian
/// el flag de activación y la membresía de lecciones; el contenido nunca se
/// reescribe en sitio: los cambios se publican como una versión nueva.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseVersion {
  id: Uuid,
  course_id: Uuid,
  version_number: i32,
  changelog: Option<String>,
  is_active: bool,
  published_at: DateTime<Utc>,
}

impl CourseVersion {
  /// Crea una versión nueva, inactiva por defecto. La activación es una
  /// decisión del catálogo (a lo sumo una versión activa por curso).
  pub fn new(course_id: Uuid, version_number: i32, changelog: Option<String>) -> Result<Self, DomainError> {
    if version_number < 1 {
      return Err(DomainError::ValidationError("El número de versión debe ser mayor o igual a 1".to_string()));
    }
    Ok(Self { id: Uuid::new_v4(),
              course_id,
              version_number,
              changelog,
              is_active: false,
              published_at: Utc::now() })
  }

  /// Reconstruye una versión desde persistencia.
  pub fn from_parts(id: Uuid,
                    course_id: Uuid,
                    version_number: i32,
                    changelog: Option<String>,
                    is_active: bool,
                    published_at: DateTime<Utc>)
                    -> Self {
    Self { id, course_id, version_number, changelog, is_active, published_at }
  }

  /// Devuelve una copia con el flag de activación dado.
  pub fn with_active(&self, active: bool) -> Self {
    let mut v = self.clone();
    v.is_active = active;
    v
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn course_id(&self) -> Uuid {
    self.course_id
  }

  pub fn version_number(&self) -> i32 {
    self.version_number
  }

  pub fn changelog(&self) -> Option<&str> {
    self.changelog.as_deref()
  }

  pub fn is_active(&self) -> bool {
    self.is_active
  }

  pub fn published_at(&self) -> DateTime<Utc> {
    self.published_at
  }
}

impl fmt::Display for CourseVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "CourseVersion(course: {}, v{}, active: {})",
           self.course_id, self.version_number, self.is_active)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_version_is_inactive() {
    let v = CourseVersion::new(Uuid::new_v4(), 1, Some("primera versión".into())).expect("version");
    assert!(!v.is_active());
    assert_eq!(v.version_number(), 1);
  }

  #[test]
  fn version_number_must_be_positive() {
    assert!(matches!(CourseVersion::new(Uuid::new_v4(), 0, None), Err(DomainError::ValidationError(_))));
  }

  #[test]
  fn with_active_toggles_only_the_flag() {
    let v = CourseVersion::new(Uuid::new_v4(), 3, None).expect("version");
    let activated = v.with_active(true);
    assert!(activated.is_active());
    assert_eq!(activated.id(), v.id());
    assert_eq!(activated.version_number(), v.version_number());
  }
}
