use ntex::web;

use super::{body, hatif, rekaz};

pub fn rekaz(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhooks/rekaz")
            .state(body::payload_config())
            .service(rekaz::routes::receive),
    );
}

pub fn hatif(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/webhooks/hatif/whatsapp")
            .state(body::payload_config())
            .service(hatif::routes::receive),
    );
}
