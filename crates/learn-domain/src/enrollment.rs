// enrollment.rs
use crate::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Estado de la relación estudiante–curso.
///
/// `Completed` es terminal: una inscripción completada nunca retrocede.
/// `Dropped` y `Suspended` son estados administrativos alcanzables desde
/// superficies externas a este motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentStatus {
  Active,
  Completed,
  Dropped,
  Suspended,
}

impl EnrollmentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      EnrollmentStatus::Active => "active",
      EnrollmentStatus::Completed => "completed",
      EnrollmentStatus::Dropped => "dropped",
      EnrollmentStatus::Suspended => "suspended",
    }
  }
}

impl FromStr for EnrollmentStatus {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "active" => Ok(EnrollmentStatus::Active),
      "completed" => Ok(EnrollmentStatus::Completed),
      "dropped" => Ok(EnrollmentStatus::Dropped),
      "suspended" => Ok(EnrollmentStatus::Suspended),
      other => Err(DomainError::ValidationError(format!("Estado de inscripción desconocido: {}", other))),
    }
  }
}

impl fmt::Display for EnrollmentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Porcentaje de avance redondeado a dos decimales.
///
/// Regla compartida por todas las implementaciones de repositorio: el
/// porcentaje cacheado de una inscripción siempre es
/// `round(completadas / total × 100, 2)`. Con cero lecciones el avance se
/// define como 0 (no es un error, evita la división por cero).
pub fn progress_percentage(completed: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  (completed as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

/// Relación estudiante–curso, anclada a una versión concreta.
///
/// El `course_version_id` se captura al inscribirse (la versión activa en
/// ese momento) y no cambia nunca: el avance se mide siempre contra el
/// conjunto de lecciones de la versión anclada, aunque el curso active
/// versiones nuevas después.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  id: Uuid,
  student_id: Uuid,
  course_id: Uuid,
  course_version_id: Uuid,
  status: EnrollmentStatus,
  progress_percentage: f64,
  enrolled_at: DateTime<Utc>,
  completed_at: Option<DateTime<Utc>>,
  last_accessed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
  /// Crea una inscripción activa con avance 0, anclada a la versión dada.
  pub fn new(student_id: Uuid, course_id: Uuid, course_version_id: Uuid) -> Self {
    Self { id: Uuid::new_v4(),
           student_id,
           course_id,
           course_version_id,
           status: EnrollmentStatus::Active,
           progress_percentage: 0.0,
           enrolled_at: Utc::now(),
           completed_at: None,
           last_accessed_at: None }
  }

  /// Reconstruye una inscripción desde persistencia.
  #[allow(clippy::too_many_arguments)]
  pub fn from_parts(id: Uuid,
                    student_id: Uuid,
                    course_id: Uuid,
                    course_version_id: Uuid,
                    status: EnrollmentStatus,
                    progress_percentage: f64,
                    enrolled_at: DateTime<Utc>,
                    completed_at: Option<DateTime<Utc>>,
                    last_accessed_at: Option<DateTime<Utc>>)
                    -> Self {
    Self { id,
           student_id,
           course_id,
           course_version_id,
           status,
           progress_percentage,
           enrolled_at,
           completed_at,
           last_accessed_at }
  }

  /// Devuelve una copia con el porcentaje cacheado y la marca de último
  /// acceso actualizados.
  pub fn with_progress(&self, percentage: f64) -> Self {
    let mut e = self.clone();
    e.progress_percentage = percentage;
    e.last_accessed_at = Some(Utc::now());
    e
  }

  /// Marca la inscripción como completada: estado `Completed`, porcentaje
  /// fijado en 100 y fecha de finalización.
  pub fn completed(&self) -> Self {
    let mut e = self.clone();
    e.status = EnrollmentStatus::Completed;
    e.progress_percentage = 100.0;
    e.completed_at = Some(Utc::now());
    e
  }

  pub fn is_completed(&self) -> bool {
    self.status == EnrollmentStatus::Completed
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

  pub fn course_version_id(&self) -> Uuid {
    self.course_version_id
  }

  pub fn status(&self) -> EnrollmentStatus {
    self.status
  }

  pub fn progress_percentage(&self) -> f64 {
    self.progress_percentage
  }

  pub fn enrolled_at(&self) -> DateTime<Utc> {
    self.enrolled_at
  }

  pub fn completed_at(&self) -> Option<DateTime<Utc>> {
    self.completed_at
  }

  pub fn last_accessed_at(&self) -> Option<DateTime<Utc>> {
    self.last_accessed_at
  }
}

impl fmt::Display for Enrollment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Enrollment(student: {}, course: {}, status: {}, {}%)",
           self.student_id, self.course_id, self.status, self.progress_percentage)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_enrollment_is_active_at_zero() {
    let e = Enrollment::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    assert_eq!(e.status(), EnrollmentStatus::Active);
    assert_eq!(e.progress_percentage(), 0.0);
    assert!(e.completed_at().is_none());
  }

  #[test]
  fn completed_pins_percentage_and_stamps_date() {
    let e = Enrollment::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let done = e.with_progress(100.0).completed();
    assert!(done.is_completed());
    assert_eq!(done.progress_percentage(), 100.0);
    assert!(done.completed_at().is_some());
  }

  #[test]
  fn percentage_rounds_to_two_decimals() {
    assert_eq!(progress_percentage(3, 4), 75.0);
    assert_eq!(progress_percentage(1, 3), 33.33);
    assert_eq!(progress_percentage(2, 3), 66.67);
    assert_eq!(progress_percentage(4, 4), 100.0);
    assert_eq!(progress_percentage(0, 7), 0.0);
  }

  #[test]
  fn zero_lessons_means_zero_percent() {
    // definido como 0%, no como error
    assert_eq!(progress_percentage(0, 0), 0.0);
  }
}
