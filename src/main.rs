use camp_chat::{chat_relay, RoomAllowList};
use trillium::{Conn, Handler, KnownHeaderName, Method, Status};
use trillium_logger::logger;
use trillium_router::router;

/// Permissive cross-origin policy for browser clients served from
/// another origin, answering preflights directly.
#[derive(Debug, Clone, Copy)]
struct Cors;

impl Handler for Cors {
    async fn run(&self, conn: Conn) -> Conn {
        let conn = conn
            .with_response_header(KnownHeaderName::AccessControlAllowOrigin, "*")
            .with_response_header(
                KnownHeaderName::AccessControlAllowMethods,
                "GET, POST, OPTIONS",
            )
            .with_response_header(KnownHeaderName::AccessControlAllowHeaders, "Content-Type")
            .with_response_header(KnownHeaderName::AccessControlMaxAge, "86400");

        if conn.method() == Method::Options {
            conn.with_status(Status::NoContent).halt()
        } else {
            conn
        }
    }
}

fn main() {
    env_logger::init();

    let room_codes = std::env::var("ROOM_CODES").unwrap_or_default();
    let allow_list = RoomAllowList::from_delimited(&room_codes);
    log::info!("relay starting with {} room code(s)", allow_list.len());

    trillium_smol::run((
        logger(),
        Cors,
        router()
            .get("/health", |conn: Conn| async move { conn.ok("ok") })
            .get("/ws", chat_relay(allow_list)),
    ));
}
