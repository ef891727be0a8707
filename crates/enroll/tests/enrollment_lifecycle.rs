use enroll::stubs::InMemoryLearnRepository;
use enroll::{EnrollError, EnrollmentService};
use learn_domain::{ContentType, EnrollmentStatus};
use std::sync::Arc;
use uuid::Uuid;

type Service = EnrollmentService<InMemoryLearnRepository>;

/// Crea un curso publicado con una versión activa de `lessons` lecciones y
/// devuelve (service, course_id, lesson_ids).
fn published_course(service: &Service, lessons: usize) -> (Uuid, Vec<Uuid>) {
  let course = service.catalog()
                      .create_course("Rust básico", "Introducción al lenguaje", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create course");
  let version = service.catalog().new_version(&course.id(), Some("v1".into()), true).expect("new version");
  let mut lesson_ids = Vec::new();
  for i in 0..lessons {
    let lesson = service.catalog()
                        .add_lesson(&version.id(),
                                    format!("Lección {}", i + 1),
                                    None,
                                    ContentType::Video,
                                    None,
                                    i as i32,
                                    10,
                                    i == 0)
                        .expect("add lesson");
    lesson_ids.push(lesson.id());
  }
  service.catalog().publish(&course.id()).expect("publish");
  (course.id(), lesson_ids)
}

fn service() -> Service {
  EnrollmentService::new(Arc::new(InMemoryLearnRepository::new()))
}

#[test]
fn enroll_pins_active_version_and_bumps_counter() {
  let service = service();
  let (course_id, _lessons) = published_course(&service, 3);
  let student = Uuid::new_v4();

  let enrollment = service.enroll(&student, &course_id).expect("enroll");
  assert_eq!(enrollment.status(), EnrollmentStatus::Active);
  assert_eq!(enrollment.progress_percentage(), 0.0);

  let active = service.catalog().resolve_active_version(&course_id).expect("active version");
  assert_eq!(enrollment.course_version_id(), active.id());

  let course = service.catalog().get_course(&course_id).expect("get").expect("course");
  assert_eq!(course.total_enrollments(), 1);
  assert!(service.is_enrolled(&student, &course_id).unwrap());

  let mine = service.student_enrollments(&student).expect("student enrollments");
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].id(), enrollment.id());
}

#[test]
fn duplicate_enrollment_is_rejected() {
  let service = service();
  let (course_id, _) = published_course(&service, 2);
  let student = Uuid::new_v4();

  service.enroll(&student, &course_id).expect("first enroll");
  match service.enroll(&student, &course_id) {
    Err(EnrollError::AlreadyEnrolled { student_id, course_id: c }) => {
      assert_eq!(student_id, student);
      assert_eq!(c, course_id);
    }
    other => panic!("expected AlreadyEnrolled, got {:?}", other.map(|e| e.id())),
  }

  // el contador no se infla con el intento fallido
  let course = service.catalog().get_course(&course_id).unwrap().unwrap();
  assert_eq!(course.total_enrollments(), 1);
}

#[test]
fn enroll_requires_a_published_course() {
  let service = service();
  let student = Uuid::new_v4();

  // curso inexistente
  let missing = Uuid::new_v4();
  assert!(matches!(service.enroll(&student, &missing), Err(EnrollError::CourseNotEnrollable { .. })));

  // curso en borrador
  let draft = service.catalog()
                     .create_course("Borrador", "sin publicar", Uuid::new_v4(), Uuid::new_v4())
                     .expect("create");
  assert!(matches!(service.enroll(&student, &draft.id()), Err(EnrollError::CourseNotEnrollable { .. })));
  assert!(!service.can_enroll(&student, &draft.id()).unwrap());
}

#[test]
fn enroll_requires_an_active_version() {
  let service = service();
  // publicado pero sin ninguna versión activa
  let course = service.catalog()
                      .create_course("Sin contenido", "curso vacío", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");
  service.catalog().publish(&course.id()).expect("publish");

  let student = Uuid::new_v4();
  assert!(matches!(service.enroll(&student, &course.id()), Err(EnrollError::NoActiveVersion { .. })));
}

#[test]
fn unenroll_removes_and_decrements_counter() {
  let service = service();
  let (course_id, _) = published_course(&service, 2);
  let student = Uuid::new_v4();

  service.enroll(&student, &course_id).expect("enroll");
  service.unenroll(&student, &course_id).expect("unenroll");

  assert!(!service.is_enrolled(&student, &course_id).unwrap());
  let course = service.catalog().get_course(&course_id).unwrap().unwrap();
  assert_eq!(course.total_enrollments(), 0);

  // una segunda anulación ya no encuentra la inscripción
  assert!(matches!(service.unenroll(&student, &course_id), Err(EnrollError::NotEnrolled { .. })));
}

#[test]
fn unenroll_after_completion_is_permanent_history() {
  let service = service();
  let (course_id, lessons) = published_course(&service, 2);
  let student = Uuid::new_v4();

  service.enroll(&student, &course_id).expect("enroll");
  for lesson in &lessons {
    service.record_lesson_progress(&student, lesson, true).expect("progress");
  }
  service.complete_course(&student, &course_id).expect("complete");

  match service.unenroll(&student, &course_id) {
    Err(EnrollError::CannotUnenrollCompleted { .. }) => {}
    other => panic!("expected CannotUnenrollCompleted, got {:?}", other),
  }
  // la inscripción completada sigue ahí
  let enrollment = service.enrollment(&student, &course_id).unwrap().expect("enrollment");
  assert_eq!(enrollment.status(), EnrollmentStatus::Completed);
}

#[test]
fn concurrent_enrolls_create_exactly_one_enrollment() {
  use std::thread;

  let repo = Arc::new(InMemoryLearnRepository::new());
  let service = Arc::new(EnrollmentService::new(repo));
  let (course_id, _) = published_course(&service, 1);
  let student = Uuid::new_v4();

  let mut handles = Vec::new();
  for _ in 0..2 {
    let service = service.clone();
    handles.push(thread::spawn(move || service.enroll(&student, &course_id).map(|e| e.id())));
  }
  let results: Vec<_> = handles.into_iter().map(|h| h.join().expect("join")).collect();

  let oks = results.iter().filter(|r| r.is_ok()).count();
  let dups = results.iter()
                    .filter(|r| matches!(r, Err(EnrollError::AlreadyEnrolled { .. })))
                    .count();
  assert_eq!(oks, 1, "exactly one enroll must win");
  assert_eq!(dups, 1, "the loser must observe AlreadyEnrolled");

  assert_eq!(service.course_enrollments(&course_id).unwrap().len(), 1);
  let course = service.catalog().get_course(&course_id).unwrap().unwrap();
  assert_eq!(course.total_enrollments(), 1);
}
