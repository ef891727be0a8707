// certificate.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Constancia de finalización de un curso.
///
/// Única por par (estudiante, curso) y nunca mutada tras su creación. El
/// `verification_id` es un código único global apto para búsqueda pública:
/// prefijo del curso + token aleatorio de 128 bits + fecha de emisión.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
  id: Uuid,
  student_id: Uuid,
  course_id: Uuid,
  verification_id: String,
  issued_at: DateTime<Utc>,
  certificate_url: Option<String>,
}

impl Certificate {
  /// Emite una constancia nueva para el par (estudiante, curso).
  pub fn new(student_id: Uuid, course_id: Uuid) -> Self {
    let issued_at = Utc::now();
    let verification_id = Self::verification_code(&course_id, issued_at);
    Self { id: Uuid::new_v4(),
           student_id,
           course_id,
           verification_id,
           issued_at,
           certificate_url: None }
  }

  // Formato: LS-<8 hex del curso>-<token v4 sin guiones>-<AAAAMMDD>
  fn verification_code(course_id: &Uuid, issued_at: DateTime<Utc>) -> String {
    let course_prefix = &course_id.simple().to_string()[..8];
    format!("LS-{}-{}-{}",
            course_prefix.to_uppercase(),
            Uuid::new_v4().simple(),
            issued_at.format("%Y%m%d"))
  }

  /// Reconstruye una constancia desde persistencia.
  pub fn from_parts(id: Uuid,
                    student_id: Uuid,
                    course_id: Uuid,
                    verification_id: String,
                    issued_at: DateTime<Utc>,
                    certificate_url: Option<String>)
                    -> Self {
    Self { id, student_id, course_id, verification_id, issued_at, certificate_url }
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn student_id(&self) -> Uuid {
    self.student_id
  }

  pub fn course_id(&self) -> Uuid {
    self.course_id
  }

  pub fn verification_id(&self) -> &str {
    &self.verification_id
  }

  pub fn issued_at(&self) -> DateTime<Utc> {
    self.issued_at
  }

  pub fn certificate_url(&self) -> Option<&str> {
    self.certificate_url.as_deref()
  }
}

impl fmt::Display for Certificate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Certificate({}, student: {}, course: {})",
           self.verification_id, self.student_id, self.course_id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verification_id_carries_course_prefix_and_date() {
    let course = Uuid::new_v4();
    let cert = Certificate::new(Uuid::new_v4(), course);
    let parts: Vec<&str> = cert.verification_id().split('-').collect();
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], "LS");
    assert_eq!(parts[1], course.simple().to_string()[..8].to_uppercase());
    assert_eq!(parts[2].len(), 32);
    assert_eq!(parts[3], cert.issued_at().format("%Y%m%d").to_string());
  }

  #[test]
  fn verification_ids_do_not_collide_for_same_pair_and_day() {
    let student = Uuid::new_v4();
    let course = Uuid::new_v4();
    let a = Certificate::new(student, course);
    let b = Certificate::new(student, course);
    // mismo par y mismo día: el token aleatorio mantiene la unicidad
    assert_ne!(a.verification_id(), b.verification_id());
  }
}
