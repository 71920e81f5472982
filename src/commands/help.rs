use super::CommandResult;

const HELP: &str = "\
Sesion
  login <email> <password>               Iniciar sesion
  register <email> <password> [nombre]   Crear cuenta
  logout                                 Cerrar sesion
  me                                     Ver el usuario actual

Transacciones
  create <user_id> <monto> <tipo>        Crear y procesar (deposito|retiro|transferencia)
  queue <user_id> <monto> <tipo>         Encolar para procesamiento en segundo plano
  list [user_id|-] [estado]              Listar (pendiente|procesado|fallido)
  show <id>                              Ver una transaccion
  refresh                                Volver a cargar la lista

Asistente
  summarize <texto>                      Resumir un texto
  summaries [p2]                         Historial de resumenes
  wiki <termino>                         Buscar y resumir en Wikipedia
  wiki-history [p2]                      Historial de busquedas

General
  notifications                          Ver notificaciones activas
  dismiss <id>                           Descartar una notificacion
  status                                 Estado de la conexion en vivo
  help                                   Mostrar esta ayuda
  quit                                   Salir";

pub fn execute() -> CommandResult {
    println!("{}", HELP);
    Ok(())
}
