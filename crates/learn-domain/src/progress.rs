// progress.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Registro de avance por lección dentro de una inscripción.
///
/// Clave compuesta única (enrollment_id, lesson_id); lo crea y actualiza
/// únicamente el rastreador de progreso. Al des-completar una lección la
/// fecha de finalización se limpia.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
  id: Uuid,
  enrollment_id: Uuid,
  lesson_id: Uuid,
  is_completed: bool,
  completed_at: Option<DateTime<Utc>>,
  time_spent_minutes: i32,
  last_accessed_at: DateTime<Utc>,
}

impl Progress {
  /// Crea un registro nuevo para el par (inscripción, lección).
  pub fn new(enrollment_id: Uuid, lesson_id: Uuid, completed: bool) -> Self {
    let now = Utc::now();
    Self { id: Uuid::new_v4(),
           enrollment_id,
           lesson_id,
           is_completed: completed,
           completed_at: if completed { Some(now) } else { None },
           time_spent_minutes: 0,
           last_accessed_at: now }
  }

  /// Reconstruye un registro desde persistencia.
  pub fn from_parts(id: Uuid,
                    enrollment_id: Uuid,
                    lesson_id: Uuid,
                    is_completed: bool,
                    completed_at: Option<DateTime<Utc>>,
                    time_spent_minutes: i32,
                    last_accessed_at: DateTime<Utc>)
                    -> Self {
    Self { id,
           enrollment_id,
           lesson_id,
           is_completed,
           completed_at,
           time_spent_minutes,
           last_accessed_at }
  }

  /// Devuelve una copia con el flag de completado actualizado; la fecha se
  /// fija al completar y se limpia al des-completar.
  pub fn with_completed(&self, completed: bool) -> Self {
    let mut p = self.clone();
    let now = Utc::now();
    p.is_completed = completed;
    p.completed_at = if completed { Some(now) } else { None };
    p.last_accessed_at = now;
    p
  }

  /// Devuelve una copia acumulando minutos de estudio.
  pub fn with_time_spent(&self, extra_minutes: i32) -> Self {
    let mut p = self.clone();
    p.time_spent_minutes = p.time_spent_minutes.saturating_add(extra_minutes.max(0));
    p.last_accessed_at = Utc::now();
    p
  }

  pub fn id(&self) -> Uuid {
    self.id
  }

  pub fn enrollment_id(&self) -> Uuid {
    self.enrollment_id
  }

  pub fn lesson_id(&self) -> Uuid {
    self.lesson_id
  }

  pub fn is_completed(&self) -> bool {
    self.is_completed
  }

  pub fn completed_at(&self) -> Option<DateTime<Utc>> {
    self.completed_at
  }

  pub fn time_spent_minutes(&self) -> i32 {
    self.time_spent_minutes
  }

  pub fn last_accessed_at(&self) -> DateTime<Utc> {
    self.last_accessed_at
  }
}

impl fmt::Display for Progress {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Progress(enrollment: {}, lesson: {}, completed: {})",
           self.enrollment_id, self.lesson_id, self.is_completed)
  }
}
