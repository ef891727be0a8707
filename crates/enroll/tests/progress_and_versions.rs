use enroll::stubs::InMemoryLearnRepository;
use enroll::{EnrollError, EnrollmentService};
use learn_domain::{ContentType, EnrollmentStatus};
use std::sync::Arc;
use uuid::Uuid;

type Service = EnrollmentService<InMemoryLearnRepository>;

fn service() -> Service {
  EnrollmentService::new(Arc::new(InMemoryLearnRepository::new()))
}

fn published_course(service: &Service, lessons: usize) -> (Uuid, Vec<Uuid>) {
  let course = service.catalog()
                      .create_course("Persistencia con Diesel", "ORM en Rust", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create course");
  let version = service.catalog().new_version(&course.id(), None, true).expect("new version");
  let mut lesson_ids = Vec::new();
  for i in 0..lessons {
    let lesson = service.catalog()
                        .add_lesson(&version.id(),
                                    format!("Lección {}", i + 1),
                                    None,
                                    ContentType::Text,
                                    None,
                                    i as i32,
                                    15,
                                    false)
                        .expect("add lesson");
    lesson_ids.push(lesson.id());
  }
  service.catalog().publish(&course.id()).expect("publish");
  (course.id(), lesson_ids)
}

#[test]
fn four_lesson_scenario_reaches_completion() {
  let service = service();
  let (course_id, lessons) = published_course(&service, 4);
  let student = Uuid::new_v4();

  let enrollment = service.enroll(&student, &course_id).expect("enroll");
  assert_eq!(enrollment.progress_percentage(), 0.0);

  // completa las lecciones 1–3
  for lesson in &lessons[..3] {
    service.record_lesson_progress(&student, lesson, true).expect("progress");
  }
  let e = service.enrollment(&student, &course_id).unwrap().expect("enrollment");
  assert_eq!(e.progress_percentage(), 75.0);
  assert_eq!(service.calculate_completion(&student, &course_id).unwrap(), 75.0);

  // completa la cuarta
  let pct = service.record_lesson_progress(&student, &lessons[3], true).expect("progress");
  assert_eq!(pct, 100.0);

  let cert = service.complete_course(&student, &course_id).expect("complete");
  let e = service.enrollment(&student, &course_id).unwrap().expect("enrollment");
  assert_eq!(e.status(), EnrollmentStatus::Completed);
  assert!(e.completed_at().is_some());

  // la segunda emisión devuelve la misma constancia
  let again = service.generate_certificate(&student, &course_id).expect("again");
  assert_eq!(again.verification_id(), cert.verification_id());
  assert_eq!(service.student_certificates(&student).unwrap().len(), 1);
}

#[test]
fn percentage_tracks_the_currently_marked_set() {
  let service = service();
  let (course_id, lessons) = published_course(&service, 3);
  let student = Uuid::new_v4();
  service.enroll(&student, &course_id).expect("enroll");

  let pct = service.record_lesson_progress(&student, &lessons[0], true).expect("p1");
  assert_eq!(pct, 33.33);
  let pct = service.record_lesson_progress(&student, &lessons[1], true).expect("p2");
  assert_eq!(pct, 66.67);

  // des-completar vuelve a bajar el porcentaje y limpia la fecha
  let pct = service.record_lesson_progress(&student, &lessons[1], false).expect("p2 undo");
  assert_eq!(pct, 33.33);
  let record = service.lesson_progress(&student, &lessons[1]).unwrap().expect("record");
  assert!(!record.is_completed());
  assert!(record.completed_at().is_none());

  // marcar dos veces la misma lección no duplica el registro
  service.record_lesson_progress(&student, &lessons[0], true).expect("repeat");
  assert_eq!(service.course_progress(&student, &course_id).unwrap().len(), 2);
  assert_eq!(service.calculate_completion(&student, &course_id).unwrap(), 33.33);
}

#[test]
fn progress_on_unknown_lesson_fails() {
  let service = service();
  let (_course_id, _) = published_course(&service, 1);
  let student = Uuid::new_v4();
  let missing = Uuid::new_v4();
  assert!(matches!(service.record_lesson_progress(&student, &missing, true),
                   Err(EnrollError::NoSuchLesson { .. })));
}

#[test]
fn enrollment_stays_pinned_when_a_new_version_activates() {
  let service = service();
  let (course_id, v1_lessons) = published_course(&service, 4);
  let student = Uuid::new_v4();

  let enrollment = service.enroll(&student, &course_id).expect("enroll");
  let pinned = enrollment.course_version_id();
  service.record_lesson_progress(&student, &v1_lessons[0], true).expect("progress");

  // el curso publica y activa una v2 con seis lecciones
  let v2 = service.catalog().new_version(&course_id, Some("v2".into()), true).expect("v2");
  for i in 0..6 {
    service.catalog()
           .add_lesson(&v2.id(), format!("Nueva {}", i + 1), None, ContentType::Video, None, i, 5, false)
           .expect("lesson v2");
  }

  // la inscripción existente conserva su versión y su denominador
  let e = service.enrollment(&student, &course_id).unwrap().expect("enrollment");
  assert_eq!(e.course_version_id(), pinned);
  assert_eq!(service.calculate_completion(&student, &course_id).unwrap(), 25.0);

  // las lecciones de la versión anclada siguen aceptando avance
  let pct = service.record_lesson_progress(&student, &v1_lessons[1], true).expect("progress v1");
  assert_eq!(pct, 50.0);

  // las lecciones de v2 no pertenecen a la versión anclada del estudiante
  let v2_lessons = service.catalog().lessons(&v2.id()).expect("lessons v2");
  match service.record_lesson_progress(&student, &v2_lessons[0].id(), true) {
    Err(EnrollError::NotEnrolledInVersion { version_id, .. }) => assert_eq!(version_id, v2.id()),
    other => panic!("expected NotEnrolledInVersion, got {:?}", other),
  }

  // un estudiante nuevo queda anclado a la v2 activa
  let newcomer = Uuid::new_v4();
  let fresh = service.enroll(&newcomer, &course_id).expect("enroll v2");
  assert_eq!(fresh.course_version_id(), v2.id());
}

#[test]
fn completion_is_zero_without_enrollment_or_lessons() {
  let service = service();
  let (course_id, _) = published_course(&service, 2);

  // sin inscripción: 0, no error
  let stranger = Uuid::new_v4();
  assert_eq!(service.calculate_completion(&stranger, &course_id).unwrap(), 0.0);
  assert!(service.course_progress(&stranger, &course_id).unwrap().is_empty());

  // versión activa sin lecciones: 0, no división por cero
  let empty = service.catalog()
                     .create_course("Vacío", "sin lecciones", Uuid::new_v4(), Uuid::new_v4())
                     .expect("create");
  service.catalog().new_version(&empty.id(), None, true).expect("version");
  service.catalog().publish(&empty.id()).expect("publish");
  let student = Uuid::new_v4();
  service.enroll(&student, &empty.id()).expect("enroll");
  assert_eq!(service.calculate_completion(&student, &empty.id()).unwrap(), 0.0);
}
