use enroll::stubs::InMemoryLearnRepository;
use enroll::{EnrollError, EnrollmentService};
use learn_domain::ContentType;
use std::sync::Arc;
use uuid::Uuid;

type Service = EnrollmentService<InMemoryLearnRepository>;

fn service() -> Service {
  EnrollmentService::new(Arc::new(InMemoryLearnRepository::new()))
}

fn enrolled_student(service: &Service, lessons: usize) -> (Uuid, Uuid, Vec<Uuid>) {
  let course = service.catalog()
                      .create_course("Testing en Rust", "pruebas y más pruebas", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create course");
  let version = service.catalog().new_version(&course.id(), None, true).expect("version");
  let mut lesson_ids = Vec::new();
  for i in 0..lessons {
    let lesson = service.catalog()
                        .add_lesson(&version.id(), format!("L{}", i + 1), None, ContentType::Quiz, None, i as i32, 5, false)
                        .expect("lesson");
    lesson_ids.push(lesson.id());
  }
  service.catalog().publish(&course.id()).expect("publish");
  let student = Uuid::new_v4();
  service.enroll(&student, &course.id()).expect("enroll");
  (student, course.id(), lesson_ids)
}

#[test]
fn completion_gate_requires_exactly_one_hundred() {
  let service = service();
  let (student, course_id, lessons) = enrolled_student(&service, 4);

  // 0%: incompleto
  match service.complete_course(&student, &course_id) {
    Err(EnrollError::IncompleteProgress { percentage, .. }) => assert_eq!(percentage, 0.0),
    other => panic!("expected IncompleteProgress, got {:?}", other),
  }

  // 75%: sigue incompleto
  for lesson in &lessons[..3] {
    service.record_lesson_progress(&student, lesson, true).expect("progress");
  }
  match service.complete_course(&student, &course_id) {
    Err(EnrollError::IncompleteProgress { percentage, .. }) => assert_eq!(percentage, 75.0),
    other => panic!("expected IncompleteProgress, got {:?}", other),
  }

  // 100%: la transición procede
  service.record_lesson_progress(&student, &lessons[3], true).expect("progress");
  service.complete_course(&student, &course_id).expect("complete at 100");
  assert!(service.has_completed(&student, &course_id).unwrap());
}

#[test]
fn certificate_requires_a_completed_enrollment() {
  let service = service();
  let (student, course_id, _lessons) = enrolled_student(&service, 2);

  // inscrito pero activo: sin constancia
  assert!(matches!(service.generate_certificate(&student, &course_id),
                   Err(EnrollError::CourseNotCompleted { .. })));

  // sin inscripción: mismo fallo
  let stranger = Uuid::new_v4();
  assert!(matches!(service.generate_certificate(&stranger, &course_id),
                   Err(EnrollError::CourseNotCompleted { .. })));
}

#[test]
fn certificate_issuance_is_idempotent() {
  let service = service();
  let (student, course_id, lessons) = enrolled_student(&service, 2);
  for lesson in &lessons {
    service.record_lesson_progress(&student, lesson, true).expect("progress");
  }
  let first = service.complete_course(&student, &course_id).expect("complete");

  let second = service.generate_certificate(&student, &course_id).expect("second");
  let third = service.generate_certificate(&student, &course_id).expect("third");
  assert_eq!(first.verification_id(), second.verification_id());
  assert_eq!(second.verification_id(), third.verification_id());
  assert_eq!(first.id(), third.id());
  assert_eq!(service.student_certificates(&student).unwrap().len(), 1);
}

#[test]
fn concurrent_completions_issue_a_single_certificate() {
  use std::thread;

  let service = Arc::new(service());
  let (student, course_id, lessons) = enrolled_student(&service, 2);
  for lesson in &lessons {
    service.record_lesson_progress(&student, lesson, true).expect("progress");
  }

  let mut handles = Vec::new();
  for _ in 0..2 {
    let service = service.clone();
    handles.push(thread::spawn(move || service.complete_course(&student, &course_id)));
  }
  let certs: Vec<_> = handles.into_iter()
                             .map(|h| h.join().expect("join").expect("complete"))
                             .collect();

  assert_eq!(certs[0].verification_id(), certs[1].verification_id());
  assert_eq!(service.student_certificates(&student).unwrap().len(), 1);
}

#[test]
fn verification_lookup_finds_the_certificate() {
  let service = service();
  let (student, course_id, lessons) = enrolled_student(&service, 1);
  service.record_lesson_progress(&student, &lessons[0], true).expect("progress");
  let cert = service.complete_course(&student, &course_id).expect("complete");

  let found = service.verify_certificate(cert.verification_id()).expect("lookup").expect("found");
  assert_eq!(found.id(), cert.id());
  assert_eq!(found.student_id(), student);

  assert!(service.verify_certificate("LS-00000000-ffffffffffffffffffffffffffffffff-20200101")
                 .expect("lookup")
                 .is_none());
}
