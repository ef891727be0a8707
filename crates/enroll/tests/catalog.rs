use enroll::stubs::InMemoryLearnRepository;
use enroll::{CourseCatalog, EnrollError};
use learn_domain::{ContentType, CourseStatus, DifficultyLevel, DomainError};
use std::sync::Arc;
use uuid::Uuid;

fn catalog() -> CourseCatalog<InMemoryLearnRepository> {
  CourseCatalog::new(Arc::new(InMemoryLearnRepository::new()))
}

#[test]
fn version_numbers_grow_monotonically_per_course() {
  let catalog = catalog();
  let course = catalog.create_course("Async en Rust", "futures y executors", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");

  let v1 = catalog.new_version(&course.id(), None, false).expect("v1");
  let v2 = catalog.new_version(&course.id(), Some("más contenido".into()), false).expect("v2");
  let v3 = catalog.new_version(&course.id(), None, false).expect("v3");
  assert_eq!(v1.version_number(), 1);
  assert_eq!(v2.version_number(), 2);
  assert_eq!(v3.version_number(), 3);

  let versions = catalog.versions(&course.id()).expect("versions");
  let numbers: Vec<i32> = versions.iter().map(|v| v.version_number()).collect();
  assert_eq!(numbers, vec![1, 2, 3]);
}

#[test]
fn activation_keeps_at_most_one_version_active() {
  let catalog = catalog();
  let course = catalog.create_course("Macros", "macro_rules y proc macros", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");
  let v1 = catalog.new_version(&course.id(), None, true).expect("v1");
  assert!(v1.is_active());

  let v2 = catalog.new_version(&course.id(), None, true).expect("v2");
  assert!(v2.is_active());

  // la activación de v2 desactivó a v1
  let versions = catalog.versions(&course.id()).expect("versions");
  let active: Vec<_> = versions.iter().filter(|v| v.is_active()).collect();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].id(), v2.id());

  let resolved = catalog.resolve_active_version(&course.id()).expect("resolve");
  assert_eq!(resolved.id(), v2.id());

  // el puntero del curso sigue a la versión activa
  let course = catalog.get_course(&course.id()).unwrap().unwrap();
  assert_eq!(course.current_version_id(), Some(v2.id()));
}

#[test]
fn resolve_active_version_fails_without_one() {
  let catalog = catalog();
  let course = catalog.create_course("Sin versión", "todavía vacío", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");
  catalog.new_version(&course.id(), None, false).expect("inactive version");

  assert!(matches!(catalog.resolve_active_version(&course.id()),
                   Err(EnrollError::NoActiveVersion { .. })));
}

#[test]
fn delete_is_limited_to_draft_courses() {
  let catalog = catalog();
  let course = catalog.create_course("Efímero", "se elimina pronto", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");
  catalog.delete_course(&course.id()).expect("delete draft");
  assert!(catalog.get_course(&course.id()).unwrap().is_none());

  let kept = catalog.create_course("Permanente", "ya publicado", Uuid::new_v4(), Uuid::new_v4())
                    .expect("create");
  catalog.publish(&kept.id()).expect("publish");
  match catalog.delete_course(&kept.id()) {
    Err(EnrollError::Domain(DomainError::InvalidTransition(_))) => {}
    other => panic!("expected InvalidTransition, got {:?}", other),
  }
  assert!(catalog.get_course(&kept.id()).unwrap().is_some());
}

#[test]
fn review_flow_moves_through_the_gates() {
  let catalog = catalog();
  let course = catalog.create_course("Revisado", "pasa por revisión", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");

  let reviewing = catalog.submit_for_review(&course.id()).expect("submit");
  assert_eq!(reviewing.status(), CourseStatus::UnderReview);

  let rejected = catalog.reject(&course.id(), "faltan ejemplos").expect("reject");
  assert_eq!(rejected.status(), CourseStatus::Draft);

  catalog.submit_for_review(&course.id()).expect("submit again");
  let approved = catalog.approve(&course.id()).expect("approve");
  assert_eq!(approved.status(), CourseStatus::Published);

  let archived = catalog.archive(&course.id()).expect("archive");
  assert_eq!(archived.status(), CourseStatus::Archived);
}

#[test]
fn search_filters_published_courses_by_term() {
  let catalog = catalog();
  let instructor = Uuid::new_v4();
  let a = catalog.create_course("Rust avanzado", "lifetimes y unsafe", instructor, Uuid::new_v4()).expect("a");
  let b = catalog.create_course("Python básico", "listas y dicts", instructor, Uuid::new_v4()).expect("b");
  let _draft = catalog.create_course("Rust oculto", "sigue en borrador", instructor, Uuid::new_v4()).expect("c");
  catalog.publish(&a.id()).expect("publish a");
  catalog.publish(&b.id()).expect("publish b");

  let hits = catalog.search_courses("rust").expect("search");
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].id(), a.id());

  // término vacío: todos los publicados
  assert_eq!(catalog.search_courses("  ").expect("all").len(), 2);

  // la descripción también cuenta
  let hits = catalog.search_courses("DICTS").expect("search desc");
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].id(), b.id());

  // el listado por instructor incluye también los borradores
  assert_eq!(catalog.courses_by_instructor(&instructor).expect("by instructor").len(), 3);
  assert_eq!(catalog.list_courses().expect("all").len(), 3);
}

#[test]
fn difficulty_can_be_adjusted_by_the_catalog() {
  let catalog = catalog();
  let course = catalog.create_course("Escalable", "sube de nivel", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");
  assert_eq!(course.difficulty(), DifficultyLevel::Beginner);

  let harder = catalog.set_difficulty(&course.id(), DifficultyLevel::Advanced).expect("set");
  assert_eq!(harder.difficulty(), DifficultyLevel::Advanced);
  let stored = catalog.get_course(&course.id()).unwrap().unwrap();
  assert_eq!(stored.difficulty(), DifficultyLevel::Advanced);
}

#[test]
fn lessons_come_back_ordered_by_index() {
  let catalog = catalog();
  let course = catalog.create_course("Ordenado", "lecciones en secuencia", Uuid::new_v4(), Uuid::new_v4())
                      .expect("create");
  let version = catalog.new_version(&course.id(), None, true).expect("version");

  for (title, idx) in [("tercera", 2), ("primera", 0), ("segunda", 1)] {
    catalog.add_lesson(&version.id(), title, None, ContentType::Video, None, idx, 10, false)
           .expect("lesson");
  }

  let lessons = catalog.lessons(&version.id()).expect("lessons");
  let titles: Vec<&str> = lessons.iter().map(|l| l.title()).collect();
  assert_eq!(titles, vec!["primera", "segunda", "tercera"]);

  // lección sobre versión inexistente
  let missing = Uuid::new_v4();
  assert!(matches!(catalog.add_lesson(&missing, "x", None, ContentType::Pdf, None, 0, 1, false),
                   Err(EnrollError::NotFound(_))));
}

#[test]
fn only_the_owning_instructor_can_edit() {
  let catalog = catalog();
  let owner = Uuid::new_v4();
  let course = catalog.create_course("Propio", "del instructor", owner, Uuid::new_v4()).expect("create");

  assert!(catalog.can_edit(&course.id(), &owner).unwrap());
  assert!(!catalog.can_edit(&course.id(), &Uuid::new_v4()).unwrap());
  assert!(!catalog.can_edit(&Uuid::new_v4(), &owner).unwrap());
}
