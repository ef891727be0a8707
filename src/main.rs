use enroll::EnrollmentService;
use learn_domain::ContentType;
use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use uuid::Uuid;

/// Pequeño menú interactivo para ejercitar el motor de inscripciones usando
/// el repositorio proporcionado por `learn-persistence`.
///
/// Opciones soportadas:
/// 1) Ver cursos (tabla con id, estado e inscritos)
/// 2) Crear curso de demostración (versión activa + 4 lecciones, publicado)
/// 3) Ver lecciones de la versión activa de un curso
/// 4) Inscribir estudiante en un curso
/// 5) Registrar avance de una lección
/// 6) Completar curso y emitir constancia
/// 7) Verificar una constancia por código
/// 8) Salir
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    // Inicializar repo (aplica migraciones embebidas si procede)
    let repo = learn_persistence::new_from_env().map_err(|e| Box::new(e) as Box<dyn Error>)?;
    let service = EnrollmentService::new(Arc::new(repo));

    loop {
        println!("\n== LearnSphere menu ==");
        println!("1) Ver cursos");
        println!("2) Crear curso de demostración");
        println!("3) Ver lecciones de un curso");
        println!("4) Inscribir estudiante");
        println!("5) Registrar avance de lección");
        println!("6) Completar curso y emitir constancia");
        println!("7) Verificar constancia");
        println!("8) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => {
                match service.catalog().list_courses() {
                    Ok(courses) => {
                        println!("\nID                                   | ESTADO       | INSCRITOS | TITULO");
                        println!("--------------------------------------------------------------------------------");
                        for c in courses {
                            println!("{} | {:12} | {:9} | {}", c.id(), c.status().to_string(), c.total_enrollments(), c.title());
                        }
                    }
                    Err(e) => eprintln!("Error listando cursos: {}", e),
                }
            }
            "2" => {
                let title = prompt("Título del curso: ")?;
                let title = if title.trim().is_empty() { "Curso de demostración".to_string() } else { title.trim().to_string() };
                let result = service.catalog()
                    .create_course(title.as_str(), "Curso generado desde learn-core", Uuid::new_v4(), Uuid::new_v4())
                    .and_then(|course| {
                        let version = service.catalog().new_version(&course.id(), Some("v1".into()), true)?;
                        for i in 0..4 {
                            service.catalog().add_lesson(&version.id(),
                                                         format!("Lección {}", i + 1),
                                                         None,
                                                         ContentType::Video,
                                                         None,
                                                         i,
                                                         10,
                                                         i == 0)?;
                        }
                        service.catalog().publish(&course.id())?;
                        Ok((course, version))
                    });
                match result {
                    Ok((course, version)) => {
                        println!("Curso creado y publicado: {}", course.id());
                        println!("Versión activa: {} (v{})", version.id(), version.version_number());
                    }
                    Err(e) => eprintln!("Error creando curso de demostración: {}", e),
                }
            }
            "3" => {
                let id_s = prompt("Curso id (UUID): ")?;
                let course_id = match Uuid::parse_str(id_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                match service.catalog().resolve_active_version(&course_id) {
                    Ok(version) => match service.catalog().lessons(&version.id()) {
                        Ok(lessons) => {
                            println!("\nVersión activa v{} ({})", version.version_number(), version.id());
                            for l in lessons {
                                println!("  #{} {} [{}] - {}", l.order_index(), l.id(), l.content_type().as_str(), l.title());
                            }
                        }
                        Err(e) => eprintln!("Error listando lecciones: {}", e),
                    },
                    Err(e) => eprintln!("No se pudo resolver la versión activa: {}", e),
                }
            }
            "4" => {
                let course_s = prompt("Curso id (UUID): ")?;
                let course_id = match Uuid::parse_str(course_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                let student_s = prompt("Estudiante id (UUID, enter para generar uno): ")?;
                let student_id = if student_s.trim().is_empty() {
                    let fresh = Uuid::new_v4();
                    println!("Estudiante generado: {}", fresh);
                    fresh
                } else {
                    match Uuid::parse_str(student_s.trim()) {
                        Ok(u) => u,
                        Err(_) => { eprintln!("UUID inválido"); continue; }
                    }
                };
                match service.enroll(&student_id, &course_id) {
                    Ok(e) => println!("Inscripción creada: {} (versión anclada {})", e.id(), e.course_version_id()),
                    Err(e) => eprintln!("Error inscribiendo: {}", e),
                }
            }
            "5" => {
                let student_s = prompt("Estudiante id (UUID): ")?;
                let student_id = match Uuid::parse_str(student_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                let lesson_s = prompt("Lección id (UUID): ")?;
                let lesson_id = match Uuid::parse_str(lesson_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                let done_s = prompt("¿Completada? (s/n): ")?;
                let completed = matches!(done_s.trim().to_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes");
                match service.record_lesson_progress(&student_id, &lesson_id, completed) {
                    Ok(pct) => println!("Avance registrado: {}%", pct),
                    Err(e) => eprintln!("Error registrando avance: {}", e),
                }
            }
            "6" => {
                let student_s = prompt("Estudiante id (UUID): ")?;
                let student_id = match Uuid::parse_str(student_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                let course_s = prompt("Curso id (UUID): ")?;
                let course_id = match Uuid::parse_str(course_s.trim()) {
                    Ok(u) => u,
                    Err(_) => { eprintln!("UUID inválido"); continue; }
                };
                match service.complete_course(&student_id, &course_id) {
                    Ok(cert) => println!("Curso completado. Constancia: {}", cert.verification_id()),
                    Err(e) => eprintln!("Error completando curso: {}", e),
                }
            }
            "7" => {
                let code = prompt("Código de verificación: ")?;
                match service.verify_certificate(code.trim()) {
                    Ok(Some(cert)) => println!("Constancia válida: estudiante {} completó el curso {} el {}",
                                               cert.student_id(),
                                               cert.course_id(),
                                               cert.issued_at().format("%Y-%m-%d")),
                    Ok(None) => println!("No existe ninguna constancia con ese código"),
                    Err(e) => eprintln!("Error verificando constancia: {}", e),
                }
            }
            "8" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}
