use crate::schema;
use crate::schema::certificates::dsl as certs_dsl;
use crate::schema::course_versions::dsl as versions_dsl;
use crate::schema::courses::dsl as courses_dsl;
use crate::schema::enrollments::dsl as enroll_dsl;
use crate::schema::lessons::dsl as lessons_dsl;
use crate::schema::progress_records::dsl as progress_dsl;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use enroll::{CourseRepository, EnrollError, EnrollmentRepository};
use learn_domain::{progress_percentage, Certificate, Course, CourseVersion, Enrollment, Lesson, Progress};
use log::warn;
use std::sync::Arc;
use uuid::Uuid;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

type Result<T> = std::result::Result<T, EnrollError>;

#[cfg(all(feature = "pg", not(test)))]
type DbPool = Pool<ConnectionManager<PgConnection>>;
#[cfg(any(test, not(feature = "pg")))]
type DbPool = Pool<ConnectionManager<SqliteConnection>>;
#[cfg(all(feature = "pg", not(test)))]
type DbConn = PgConnection;
#[cfg(any(test, not(feature = "pg")))]
type DbConn = SqliteConnection;

/// Repo Diesel que implementa `CourseRepository` y `EnrollmentRepository`.
pub struct DieselLearnRepository {
  pool: Arc<DbPool>,
}

impl DieselLearnRepository {
  pub fn new(database_url: &str) -> Result<Self> {
    #[cfg(any(test, not(feature = "pg")))]
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    #[cfg(all(feature = "pg", not(test)))]
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder().max_size(4)
                              .build(manager)
                              .map_err(|e| EnrollError::Storage(format!("pool: {}", e)))?;
    let repo = DieselLearnRepository { pool: Arc::new(pool) };
    if let Ok(mut c) = repo.conn_raw() {
      let _ = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(&mut c);
      let _ = diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(&mut c);
      let _ = diesel::sql_query("PRAGMA foreign_keys = ON;").execute(&mut c);
      if let Err(e) = c.run_pending_migrations(MIGRATIONS) {
        warn!("migraciones pendientes fallaron: {}", e);
      }
    }
    Ok(repo)
  }

  fn conn_raw(&self) -> std::result::Result<PooledConnection<ConnectionManager<DbConn>>, r2d2::Error> {
    self.pool.get()
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>> {
    self.conn_raw().map_err(|e| EnrollError::Storage(format!("pool: {}", e)))
  }
}

// Diesel row structs for the engine tables
#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::courses)]
struct CourseRow {
  pub id: String,
  pub title: String,
  pub description: String,
  pub instructor_id: String,
  pub category_id: String,
  pub status: String,
  pub difficulty: String,
  pub current_version_id: Option<String>,
  pub total_enrollments: i64,
  pub created_at_ts: i64,
  pub updated_at_ts: Option<i64>,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::course_versions)]
struct CourseVersionRow {
  pub id: String,
  pub course_id: String,
  pub version_number: i32,
  pub changelog: Option<String>,
  pub is_active: bool,
  pub published_at_ts: i64,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::lessons)]
struct LessonRow {
  pub id: String,
  pub course_version_id: String,
  pub title: String,
  pub description: Option<String>,
  pub content_type: String,
  pub content_url: Option<String>,
  pub order_index: i32,
  pub duration_minutes: i32,
  pub is_free: bool,
  pub created_at_ts: i64,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::enrollments)]
struct EnrollmentRow {
  pub id: String,
  pub student_id: String,
  pub course_id: String,
  pub course_version_id: String,
  pub status: String,
  pub progress_percentage: f64,
  pub enrolled_at_ts: i64,
  pub completed_at_ts: Option<i64>,
  pub last_accessed_at_ts: Option<i64>,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::progress_records)]
struct ProgressRow {
  pub id: String,
  pub enrollment_id: String,
  pub lesson_id: String,
  pub is_completed: bool,
  pub completed_at_ts: Option<i64>,
  pub time_spent_minutes: i32,
  pub last_accessed_at_ts: i64,
}

#[derive(Debug, Queryable, Insertable)]
#[diesel(table_name = schema::certificates)]
struct CertificateRow {
  pub id: String,
  pub student_id: String,
  pub course_id: String,
  pub verification_id: String,
  pub issued_at_ts: i64,
  pub certificate_url: Option<String>,
}

fn map_db_err<T>(res: std::result::Result<T, DieselError>) -> Result<T> {
  res.map_err(|e| EnrollError::Storage(format!("db: {}", e)))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| EnrollError::Storage(format!("uuid inválido '{}': {}", s, e)))
}

fn from_ts(ts: i64) -> DateTime<Utc> {
  DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn opt_from_ts(ts: Option<i64>) -> Option<DateTime<Utc>> {
  ts.map(from_ts)
}

// Error local de transacción: permite devolver resultados de dominio (p.ej.
// AlreadyEnrolled tras una violación de unicidad) desde dentro del closure
// sin acoplar los tipos de error de Diesel y del motor.
enum TxError {
  Db(DieselError),
  Enroll(EnrollError),
}

impl From<DieselError> for TxError {
  fn from(e: DieselError) -> Self {
    TxError::Db(e)
  }
}

fn unwrap_tx<T>(res: std::result::Result<T, TxError>) -> Result<T> {
  match res {
    Ok(v) => Ok(v),
    Err(TxError::Enroll(e)) => Err(e),
    Err(TxError::Db(e)) => Err(EnrollError::Storage(format!("db: {}", e))),
  }
}

fn course_row(course: &Course) -> CourseRow {
  CourseRow { id: course.id().to_string(),
              title: course.title().to_string(),
              description: course.description().to_string(),
              instructor_id: course.instructor_id().to_string(),
              category_id: course.category_id().to_string(),
              status: course.status().as_str().to_string(),
              difficulty: course.difficulty().as_str().to_string(),
              current_version_id: course.current_version_id().map(|v| v.to_string()),
              total_enrollments: course.total_enrollments(),
              created_at_ts: course.created_at().timestamp(),
              updated_at_ts: course.updated_at().map(|d| d.timestamp()) }
}

fn row_course(r: CourseRow) -> Result<Course> {
  Ok(Course::from_parts(parse_uuid(&r.id)?,
                        r.title,
                        r.description,
                        parse_uuid(&r.instructor_id)?,
                        parse_uuid(&r.category_id)?,
                        r.status.parse()?,
                        r.difficulty.parse()?,
                        match r.current_version_id {
                          Some(v) => Some(parse_uuid(&v)?),
                          None => None,
                        },
                        r.total_enrollments,
                        from_ts(r.created_at_ts),
                        opt_from_ts(r.updated_at_ts)))
}

fn version_row(version: &CourseVersion) -> CourseVersionRow {
  CourseVersionRow { id: version.id().to_string(),
                     course_id: version.course_id().to_string(),
                     version_number: version.version_number(),
                     changelog: version.changelog().map(|s| s.to_string()),
                     is_active: version.is_active(),
                     published_at_ts: version.published_at().timestamp() }
}

fn row_version(r: CourseVersionRow) -> Result<CourseVersion> {
  Ok(CourseVersion::from_parts(parse_uuid(&r.id)?,
                               parse_uuid(&r.course_id)?,
                               r.version_number,
                               r.changelog,
                               r.is_active,
                               from_ts(r.published_at_ts)))
}

fn lesson_row(lesson: &Lesson) -> LessonRow {
  LessonRow { id: lesson.id().to_string(),
              course_version_id: lesson.course_version_id().to_string(),
              title: lesson.title().to_string(),
              description: lesson.description().map(|s| s.to_string()),
              content_type: lesson.content_type().as_str().to_string(),
              content_url: lesson.content_url().map(|s| s.to_string()),
              order_index: lesson.order_index(),
              duration_minutes: lesson.duration_minutes(),
              is_free: lesson.is_free(),
              created_at_ts: lesson.created_at().timestamp() }
}

fn row_lesson(r: LessonRow) -> Result<Lesson> {
  Ok(Lesson::from_parts(parse_uuid(&r.id)?,
                        parse_uuid(&r.course_version_id)?,
                        r.title,
                        r.description,
                        r.content_type.parse()?,
                        r.content_url,
                        r.order_index,
                        r.duration_minutes,
                        r.is_free,
                        from_ts(r.created_at_ts)))
}

fn enrollment_row(e: &Enrollment) -> EnrollmentRow {
  EnrollmentRow { id: e.id().to_string(),
                  student_id: e.student_id().to_string(),
                  course_id: e.course_id().to_string(),
                  course_version_id: e.course_version_id().to_string(),
                  status: e.status().as_str().to_string(),
                  progress_percentage: e.progress_percentage(),
                  enrolled_at_ts: e.enrolled_at().timestamp(),
                  completed_at_ts: e.completed_at().map(|d| d.timestamp()),
                  last_accessed_at_ts: e.last_accessed_at().map(|d| d.timestamp()) }
}

fn row_enrollment(r: EnrollmentRow) -> Result<Enrollment> {
  Ok(Enrollment::from_parts(parse_uuid(&r.id)?,
                            parse_uuid(&r.student_id)?,
                            parse_uuid(&r.course_id)?,
                            parse_uuid(&r.course_version_id)?,
                            r.status.parse()?,
                            r.progress_percentage,
                            from_ts(r.enrolled_at_ts),
                            opt_from_ts(r.completed_at_ts),
                            opt_from_ts(r.last_accessed_at_ts)))
}

fn progress_row(p: &Progress) -> ProgressRow {
  ProgressRow { id: p.id().to_string(),
                enrollment_id: p.enrollment_id().to_string(),
                lesson_id: p.lesson_id().to_string(),
                is_completed: p.is_completed(),
                completed_at_ts: p.completed_at().map(|d| d.timestamp()),
                time_spent_minutes: p.time_spent_minutes(),
                last_accessed_at_ts: p.last_accessed_at().timestamp() }
}

fn row_progress(r: ProgressRow) -> Result<Progress> {
  Ok(Progress::from_parts(parse_uuid(&r.id)?,
                          parse_uuid(&r.enrollment_id)?,
                          parse_uuid(&r.lesson_id)?,
                          r.is_completed,
                          opt_from_ts(r.completed_at_ts),
                          r.time_spent_minutes,
                          from_ts(r.last_accessed_at_ts)))
}

fn certificate_row(c: &Certificate) -> CertificateRow {
  CertificateRow { id: c.id().to_string(),
                   student_id: c.student_id().to_string(),
                   course_id: c.course_id().to_string(),
                   verification_id: c.verification_id().to_string(),
                   issued_at_ts: c.issued_at().timestamp(),
                   certificate_url: c.certificate_url().map(|s| s.to_string()) }
}

fn row_certificate(r: CertificateRow) -> Result<Certificate> {
  Ok(Certificate::from_parts(parse_uuid(&r.id)?,
                             parse_uuid(&r.student_id)?,
                             parse_uuid(&r.course_id)?,
                             r.verification_id,
                             from_ts(r.issued_at_ts),
                             r.certificate_url))
}

impl CourseRepository for DieselLearnRepository {
  fn save_course(&self, course: &Course) -> Result<Uuid> {
    let mut conn = self.conn()?;
    let row = course_row(course);
    // Upsert: try insert, on conflict update in place (la fila puede estar
    // referenciada por inscripciones, así que no se borra)
    if diesel::insert_into(courses_dsl::courses).values(&row).execute(&mut conn).is_err() {
      map_db_err(diesel::update(courses_dsl::courses.filter(courses_dsl::id.eq(&row.id)))
                   .set((courses_dsl::title.eq(&row.title),
                         courses_dsl::description.eq(&row.description),
                         courses_dsl::instructor_id.eq(&row.instructor_id),
                         courses_dsl::category_id.eq(&row.category_id),
                         courses_dsl::status.eq(&row.status),
                         courses_dsl::difficulty.eq(&row.difficulty),
                         courses_dsl::current_version_id.eq(row.current_version_id.clone()),
                         courses_dsl::total_enrollments.eq(row.total_enrollments),
                         courses_dsl::updated_at_ts.eq(row.updated_at_ts)))
                   .execute(&mut conn))?;
    }
    Ok(course.id())
  }

  fn get_course(&self, id: &Uuid) -> Result<Option<Course>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(courses_dsl::courses.filter(courses_dsl::id.eq(id.to_string()))
                                             .first::<CourseRow>(&mut conn)
                                             .optional())?;
    opt.map(row_course).transpose()
  }

  fn list_courses(&self) -> Result<Vec<Course>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(courses_dsl::courses.load::<CourseRow>(&mut conn))?;
    rows.into_iter().map(row_course).collect()
  }

  fn published_courses(&self) -> Result<Vec<Course>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(courses_dsl::courses.filter(courses_dsl::status.eq("published"))
                                              .load::<CourseRow>(&mut conn))?;
    rows.into_iter().map(row_course).collect()
  }

  fn courses_by_instructor(&self, instructor_id: &Uuid) -> Result<Vec<Course>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(courses_dsl::courses.filter(courses_dsl::instructor_id.eq(instructor_id.to_string()))
                                              .load::<CourseRow>(&mut conn))?;
    rows.into_iter().map(row_course).collect()
  }

  fn delete_course(&self, id: &Uuid) -> Result<()> {
    let mut conn = self.conn()?;
    map_db_err(diesel::delete(courses_dsl::courses.filter(courses_dsl::id.eq(id.to_string()))).execute(&mut conn))?;
    Ok(())
  }

  fn save_version(&self, version: &CourseVersion) -> Result<Uuid> {
    let mut conn = self.conn()?;
    let row = version_row(version);
    if diesel::insert_into(versions_dsl::course_versions).values(&row).execute(&mut conn).is_err() {
      map_db_err(diesel::update(versions_dsl::course_versions.filter(versions_dsl::id.eq(&row.id)))
                   .set((versions_dsl::changelog.eq(row.changelog.clone()),
                         versions_dsl::is_active.eq(row.is_active)))
                   .execute(&mut conn))?;
    }
    Ok(version.id())
  }

  fn get_version(&self, id: &Uuid) -> Result<Option<CourseVersion>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(versions_dsl::course_versions.filter(versions_dsl::id.eq(id.to_string()))
                                                      .first::<CourseVersionRow>(&mut conn)
                                                      .optional())?;
    opt.map(row_version).transpose()
  }

  fn versions_for_course(&self, course_id: &Uuid) -> Result<Vec<CourseVersion>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(versions_dsl::course_versions.filter(versions_dsl::course_id.eq(course_id.to_string()))
                                                       .order(versions_dsl::version_number.asc())
                                                       .load::<CourseVersionRow>(&mut conn))?;
    rows.into_iter().map(row_version).collect()
  }

  fn active_version(&self, course_id: &Uuid) -> Result<Option<CourseVersion>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(versions_dsl::course_versions.filter(versions_dsl::course_id.eq(course_id.to_string()))
                                                      .filter(versions_dsl::is_active.eq(true))
                                                      .first::<CourseVersionRow>(&mut conn)
                                                      .optional())?;
    opt.map(row_version).transpose()
  }

  fn activate_version(&self, course_id: &Uuid, version_id: &Uuid) -> Result<()> {
    let mut conn = self.conn()?;
    let course_s = course_id.to_string();
    let version_s = version_id.to_string();
    let res = conn.transaction::<_, TxError, _>(|conn| {
                    let target = versions_dsl::course_versions.filter(versions_dsl::id.eq(&version_s))
                                                              .first::<CourseVersionRow>(conn)
                                                              .optional()?;
                    let target = match target {
                      Some(t) if t.course_id == course_s => t,
                      Some(_) => {
                        return Err(TxError::Enroll(EnrollError::NotFound(format!(
                          "versión {} no pertenece al curso {}",
                          version_s, course_s
                        ))))
                      }
                      None => return Err(TxError::Enroll(EnrollError::NotFound(format!("versión {}", version_s)))),
                    };
                    // desactivar hermanas y activar la versión objetivo
                    diesel::update(versions_dsl::course_versions.filter(versions_dsl::course_id.eq(&course_s)))
                      .set(versions_dsl::is_active.eq(false))
                      .execute(conn)?;
                    diesel::update(versions_dsl::course_versions.filter(versions_dsl::id.eq(&target.id)))
                      .set(versions_dsl::is_active.eq(true))
                      .execute(conn)?;
                    // el puntero del curso sigue a la versión activa
                    diesel::update(courses_dsl::courses.filter(courses_dsl::id.eq(&course_s)))
                      .set((courses_dsl::current_version_id.eq(Some(version_s.clone())),
                            courses_dsl::updated_at_ts.eq(Some(Utc::now().timestamp()))))
                      .execute(conn)?;
                    Ok(())
                  });
    unwrap_tx(res)
  }

  fn save_lesson(&self, lesson: &Lesson) -> Result<Uuid> {
    let mut conn = self.conn()?;
    let row = lesson_row(lesson);
    if diesel::insert_into(lessons_dsl::lessons).values(&row).execute(&mut conn).is_err() {
      map_db_err(diesel::update(lessons_dsl::lessons.filter(lessons_dsl::id.eq(&row.id)))
                   .set((lessons_dsl::title.eq(&row.title),
                         lessons_dsl::description.eq(row.description.clone()),
                         lessons_dsl::content_type.eq(&row.content_type),
                         lessons_dsl::content_url.eq(row.content_url.clone()),
                         lessons_dsl::order_index.eq(row.order_index),
                         lessons_dsl::duration_minutes.eq(row.duration_minutes),
                         lessons_dsl::is_free.eq(row.is_free)))
                   .execute(&mut conn))?;
    }
    Ok(lesson.id())
  }

  fn get_lesson(&self, id: &Uuid) -> Result<Option<Lesson>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(lessons_dsl::lessons.filter(lessons_dsl::id.eq(id.to_string()))
                                             .first::<LessonRow>(&mut conn)
                                             .optional())?;
    opt.map(row_lesson).transpose()
  }

  fn lessons_for_version(&self, version_id: &Uuid) -> Result<Vec<Lesson>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(lessons_dsl::lessons.filter(lessons_dsl::course_version_id.eq(version_id.to_string()))
                                              .order(lessons_dsl::order_index.asc())
                                              .load::<LessonRow>(&mut conn))?;
    rows.into_iter().map(row_lesson).collect()
  }
}

impl EnrollmentRepository for DieselLearnRepository {
  fn find_enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Enrollment>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(enroll_dsl::enrollments.filter(enroll_dsl::student_id.eq(student_id.to_string()))
                                                .filter(enroll_dsl::course_id.eq(course_id.to_string()))
                                                .first::<EnrollmentRow>(&mut conn)
                                                .optional())?;
    opt.map(row_enrollment).transpose()
  }

  fn find_enrollment_by_version(&self, student_id: &Uuid, version_id: &Uuid) -> Result<Option<Enrollment>> {
    let mut conn = self.conn()?;
    // clave de versión, no de curso
    let opt = map_db_err(enroll_dsl::enrollments.filter(enroll_dsl::student_id.eq(student_id.to_string()))
                                                .filter(enroll_dsl::course_version_id.eq(version_id.to_string()))
                                                .first::<EnrollmentRow>(&mut conn)
                                                .optional())?;
    opt.map(row_enrollment).transpose()
  }

  fn enrollments_for_student(&self, student_id: &Uuid) -> Result<Vec<Enrollment>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(enroll_dsl::enrollments.filter(enroll_dsl::student_id.eq(student_id.to_string()))
                                                 .load::<EnrollmentRow>(&mut conn))?;
    rows.into_iter().map(row_enrollment).collect()
  }

  fn enrollments_for_course(&self, course_id: &Uuid) -> Result<Vec<Enrollment>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(enroll_dsl::enrollments.filter(enroll_dsl::course_id.eq(course_id.to_string()))
                                                 .load::<EnrollmentRow>(&mut conn))?;
    rows.into_iter().map(row_enrollment).collect()
  }

  fn insert_enrollment(&self, enrollment: &Enrollment) -> Result<Enrollment> {
    let mut conn = self.conn()?;
    let row = enrollment_row(enrollment);
    let res = conn.transaction::<_, TxError, _>(|conn| {
                    // la restricción única (student_id, course_id) es la
                    // fuente de verdad frente a dos enrolls concurrentes
                    match diesel::insert_into(enroll_dsl::enrollments).values(&row).execute(conn) {
                      Ok(_) => {}
                      Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                        return Err(TxError::Enroll(EnrollError::AlreadyEnrolled { student_id:
                                                                                    enrollment.student_id(),
                                                                                  course_id:
                                                                                    enrollment.course_id() }));
                      }
                      Err(e) => return Err(TxError::Db(e)),
                    }
                    // contador del curso en la misma transacción
                    diesel::update(courses_dsl::courses.filter(courses_dsl::id.eq(&row.course_id)))
                      .set(courses_dsl::total_enrollments.eq(courses_dsl::total_enrollments + 1))
                      .execute(conn)?;
                    Ok(())
                  });
    unwrap_tx(res)?;
    Ok(enrollment.clone())
  }

  fn remove_enrollment(&self, student_id: &Uuid, course_id: &Uuid) -> Result<()> {
    let mut conn = self.conn()?;
    let student_s = student_id.to_string();
    let course_s = course_id.to_string();
    let res = conn.transaction::<_, TxError, _>(|conn| {
                    let existing = enroll_dsl::enrollments.filter(enroll_dsl::student_id.eq(&student_s))
                                                          .filter(enroll_dsl::course_id.eq(&course_s))
                                                          .first::<EnrollmentRow>(conn)
                                                          .optional()?;
                    let existing = existing.ok_or(TxError::Enroll(EnrollError::NotEnrolled {
                      student_id: *student_id,
                      course_id: *course_id,
                    }))?;
                    // limpieza de los registros de avance de la inscripción
                    // (el PRAGMA foreign_keys es por conexión, así que el
                    // cascade del esquema no es garantía con pool)
                    diesel::delete(progress_dsl::progress_records.filter(progress_dsl::enrollment_id.eq(&existing.id)))
                      .execute(conn)?;
                    diesel::delete(enroll_dsl::enrollments.filter(enroll_dsl::id.eq(&existing.id))).execute(conn)?;
                    // decremento del contador en la misma transacción
                    diesel::update(courses_dsl::courses.filter(courses_dsl::id.eq(&course_s)))
                      .set(courses_dsl::total_enrollments.eq(courses_dsl::total_enrollments - 1))
                      .execute(conn)?;
                    Ok(())
                  });
    unwrap_tx(res)
  }

  fn update_enrollment(&self, enrollment: &Enrollment) -> Result<()> {
    let mut conn = self.conn()?;
    let row = enrollment_row(enrollment);
    let updated =
      map_db_err(diesel::update(enroll_dsl::enrollments.filter(enroll_dsl::id.eq(&row.id)))
                   .set((enroll_dsl::status.eq(&row.status),
                         enroll_dsl::progress_percentage.eq(row.progress_percentage),
                         enroll_dsl::completed_at_ts.eq(row.completed_at_ts),
                         enroll_dsl::last_accessed_at_ts.eq(row.last_accessed_at_ts)))
                   .execute(&mut conn))?;
    if updated == 0 {
      return Err(EnrollError::NotFound(format!("inscripción {}", row.id)));
    }
    Ok(())
  }

  fn record_progress(&self, enrollment: &Enrollment, lesson: &Lesson, completed: bool) -> Result<f64> {
    let mut conn = self.conn()?;
    let enrollment_s = enrollment.id().to_string();
    let lesson_s = lesson.id().to_string();
    let res = conn.transaction::<_, TxError, _>(|conn| {
                    // releer la inscripción dentro de la transacción
                    let current = enroll_dsl::enrollments.filter(enroll_dsl::id.eq(&enrollment_s))
                                                         .first::<EnrollmentRow>(conn)
                                                         .optional()?;
                    let current = current.ok_or(TxError::Enroll(EnrollError::NotFound(format!(
                      "inscripción {}",
                      enrollment_s
                    ))))?;

                    let now_ts = Utc::now().timestamp();
                    let completed_ts = if completed { Some(now_ts) } else { None };

                    // upsert por clave compuesta (inscripción, lección)
                    let existing = progress_dsl::progress_records
                      .filter(progress_dsl::enrollment_id.eq(&enrollment_s))
                      .filter(progress_dsl::lesson_id.eq(&lesson_s))
                      .first::<ProgressRow>(conn)
                      .optional()?;
                    match existing {
                      Some(p) => {
                        diesel::update(progress_dsl::progress_records.filter(progress_dsl::id.eq(&p.id)))
                          .set((progress_dsl::is_completed.eq(completed),
                                progress_dsl::completed_at_ts.eq(completed_ts),
                                progress_dsl::last_accessed_at_ts.eq(now_ts)))
                          .execute(conn)?;
                      }
                      None => {
                        let fresh = Progress::new(enrollment.id(), lesson.id(), completed);
                        diesel::insert_into(progress_dsl::progress_records).values(&progress_row(&fresh))
                                                                           .execute(conn)?;
                      }
                    }

                    // recálculo contra el conjunto completo de lecciones de
                    // la versión anclada, observando el estado post-upsert
                    let lesson_ids = lessons_dsl::lessons
                      .filter(lessons_dsl::course_version_id.eq(&current.course_version_id))
                      .select(lessons_dsl::id)
                      .load::<String>(conn)?;
                    let done: i64 = progress_dsl::progress_records
                      .filter(progress_dsl::enrollment_id.eq(&enrollment_s))
                      .filter(progress_dsl::is_completed.eq(true))
                      .filter(progress_dsl::lesson_id.eq_any(&lesson_ids))
                      .count()
                      .get_result(conn)?;
                    let percentage = progress_percentage(done as usize, lesson_ids.len());

                    diesel::update(enroll_dsl::enrollments.filter(enroll_dsl::id.eq(&enrollment_s)))
                      .set((enroll_dsl::progress_percentage.eq(percentage),
                            enroll_dsl::last_accessed_at_ts.eq(Some(now_ts))))
                      .execute(conn)?;
                    Ok(percentage)
                  });
    unwrap_tx(res)
  }

  fn find_progress(&self, enrollment_id: &Uuid, lesson_id: &Uuid) -> Result<Option<Progress>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(progress_dsl::progress_records.filter(progress_dsl::enrollment_id.eq(enrollment_id.to_string()))
                                                       .filter(progress_dsl::lesson_id.eq(lesson_id.to_string()))
                                                       .first::<ProgressRow>(&mut conn)
                                                       .optional())?;
    opt.map(row_progress).transpose()
  }

  fn progress_for_enrollment(&self, enrollment_id: &Uuid) -> Result<Vec<Progress>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(progress_dsl::progress_records.filter(progress_dsl::enrollment_id.eq(enrollment_id.to_string()))
                                                        .load::<ProgressRow>(&mut conn))?;
    rows.into_iter().map(row_progress).collect()
  }

  fn insert_certificate(&self, certificate: &Certificate) -> Result<Certificate> {
    let mut conn = self.conn()?;
    let row = certificate_row(certificate);
    let res = conn.transaction::<_, TxError, _>(|conn| {
                    let existing = certs_dsl::certificates.filter(certs_dsl::student_id.eq(&row.student_id))
                                                          .filter(certs_dsl::course_id.eq(&row.course_id))
                                                          .first::<CertificateRow>(conn)
                                                          .optional()?;
                    if let Some(found) = existing {
                      return Ok(found);
                    }
                    match diesel::insert_into(certs_dsl::certificates).values(&row).execute(conn) {
                      Ok(_) => {}
                      Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                        // carrera perdida: otro emisor insertó primero
                        let found = certs_dsl::certificates.filter(certs_dsl::student_id.eq(&row.student_id))
                                                           .filter(certs_dsl::course_id.eq(&row.course_id))
                                                           .first::<CertificateRow>(conn)?;
                        return Ok(found);
                      }
                      Err(e) => return Err(TxError::Db(e)),
                    }
                    let inserted = certs_dsl::certificates.filter(certs_dsl::id.eq(&row.id))
                                                          .first::<CertificateRow>(conn)?;
                    Ok(inserted)
                  });
    row_certificate(unwrap_tx(res)?)
  }

  fn find_certificate(&self, student_id: &Uuid, course_id: &Uuid) -> Result<Option<Certificate>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(certs_dsl::certificates.filter(certs_dsl::student_id.eq(student_id.to_string()))
                                                .filter(certs_dsl::course_id.eq(course_id.to_string()))
                                                .first::<CertificateRow>(&mut conn)
                                                .optional())?;
    opt.map(row_certificate).transpose()
  }

  fn find_certificate_by_verification(&self, verification_id: &str) -> Result<Option<Certificate>> {
    let mut conn = self.conn()?;
    let opt = map_db_err(certs_dsl::certificates.filter(certs_dsl::verification_id.eq(verification_id))
                                                .first::<CertificateRow>(&mut conn)
                                                .optional())?;
    opt.map(row_certificate).transpose()
  }

  fn certificates_for_student(&self, student_id: &Uuid) -> Result<Vec<Certificate>> {
    let mut conn = self.conn()?;
    let rows = map_db_err(certs_dsl::certificates.filter(certs_dsl::student_id.eq(student_id.to_string()))
                                                 .load::<CertificateRow>(&mut conn))?;
    rows.into_iter().map(row_certificate).collect()
  }
}

/// Crear repo desde las variables de entorno. Cuando se compila con la
/// feature `pg` exige una URL de Postgres (`LEARN_DB_URL` o `DATABASE_URL`);
/// sin la feature usa SQLite (archivo o memoria).
#[cfg(all(feature = "pg", not(test)))]
pub fn new_from_env() -> Result<DieselLearnRepository> {
  dotenvy::dotenv().ok();
  let url = std::env::var("LEARN_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                         .map_err(|_| {
                                           EnrollError::Storage("LEARN_DB_URL / DATABASE_URL not set".into())
                                         })?;
  let l = url.to_lowercase();
  if !(l.starts_with("postgres") || l.starts_with("postgresql://") || url.contains('@')) {
    return Err(EnrollError::Storage("LEARN_DB_URL / DATABASE_URL does not look like Postgres URL".into()));
  }
  DieselLearnRepository::new(&url)
}

#[cfg(any(test, not(feature = "pg")))]
pub fn new_from_env() -> Result<DieselLearnRepository> {
  dotenvy::dotenv().ok();
  let url = std::env::var("LEARN_DB_URL").or_else(|_| std::env::var("DATABASE_URL"))
                                         .unwrap_or_else(|_| "file:learndb?mode=memory&cache=shared".into());
  DieselLearnRepository::new(&url)
}

// Test helper: construct a DieselLearnRepository backed by explicit SQLite
// connection manager, bypassing environment parsing.
#[cfg(not(feature = "pg"))]
pub fn new_sqlite_for_test(database_url: &str) -> Result<DieselLearnRepository> {
  DieselLearnRepository::new(database_url)
}
