//! Every screen the menu can show, in the service's language (Swahili).

use super::render::{Screen, FOOTER_BACK, FOOTER_EXIT};
use super::UssdReply;
use crate::committer::Confirmation;
use crate::settings::UssdSettings;
use crate::types::{Crop, Location};

pub const INVALID_CHOICE_BANNER: &str = "CHAGUO SI SAHIHI!";
pub const INVALID_QUANTITY_BANNER: &str = "KIASI SI SAHIHI!";
pub const INVALID_TRACKING_BANNER: &str = "NAMBA SI SAHIHI";

const THANKS: &str = "Asante kwa kutumia huduma yetu!";
const TRACKING_EXAMPLE: &str = "(Mfano: TRK240315001)";

// ── Root ──────────────────────────────────────────────────────

pub fn root() -> UssdReply {
    Screen::new()
        .section([
            "Karibu Huduma ya Usafirishaji wa Mazao",
            "1. Omba Usafiri",
            "2. Fuatilia Ombi",
            "3. Mawasiliano",
            FOOTER_EXIT,
        ])
        .proceed()
}

pub fn invalid_option() -> UssdReply {
    Screen::new()
        .line("CHAGUO HALIPO")
        .section([
            "Chaguo ulilochagua halipo.",
            "Tafadhali jaribu tena na uchague chaguo sahihi.",
        ])
        .footer(FOOTER_BACK)
        .proceed()
}

pub fn contact() -> UssdReply {
    Screen::new()
        .line("MAWASILIANO YETU")
        .section([
            "Ofisi Kuu - Mbeya:",
            "Simu: +255 25 250 1234",
            "WhatsApp: +255 754 123 456",
            "Barua pepe: info@safirimazao.co.tz",
        ])
        .section([
            "Masaa ya kazi:",
            "Jumatatu - Jumamosi: 7:00 - 18:00",
            "Jumapili: 8:00 - 14:00",
        ])
        .line(THANKS)
        .end()
}

pub fn goodbye() -> UssdReply {
    Screen::new()
        .line("ASANTE KWA KUTUMIA HUDUMA YETU")
        .section([
            "Huduma ya usafirishaji mazao kwa watu wote.",
            "Karibu tena!",
        ])
        .line("Kwa huduma zaidi piga: +255 25 250 1234")
        .end()
}

// ── Transport request ─────────────────────────────────────────

pub fn crop_list(crops: &[Crop], banner: Option<&str>) -> UssdReply {
    Screen::new()
        .banner(banner)
        .line("CHAGUA ZAO UNALOTAKA KUSAFIRISHA:")
        .numbered(crops.iter().map(|c| c.name.as_str()))
        .footer(FOOTER_BACK)
        .proceed()
}

pub fn quantity_prompt(crop: &Crop, settings: &UssdSettings, banner: Option<&str>) -> UssdReply {
    Screen::new()
        .banner(banner)
        .line(format!("WEKA KIASI CHA {}:", crop.name.to_uppercase()))
        .section([
            "Andika idadi ya magunia".to_string(),
            format!(
                "(Kiwango: {}-{} magunia)",
                settings.min_quantity, settings.max_quantity
            ),
        ])
        .footer(FOOTER_BACK)
        .proceed()
}

pub fn pickup_list(locations: &[Location], banner: Option<&str>) -> UssdReply {
    Screen::new()
        .banner(banner)
        .line("CHAGUA MAHALI PA KUCHUKUA MIZIGO:")
        .numbered(locations.iter().map(|l| l.name.as_str()))
        .footer(FOOTER_BACK)
        .proceed()
}

pub fn destination_list(
    locations: &[Location],
    pickup: &Location,
    banner: Option<&str>,
) -> UssdReply {
    Screen::new()
        .banner(banner)
        .section([
            "CHAGUA MAHALI MZIGO UNAPOENDA:".to_string(),
            format!("(Kutoka: {})", pickup.name),
        ])
        .numbered(locations.iter().map(|l| l.name.as_str()))
        .footer(FOOTER_BACK)
        .proceed()
}

pub fn no_crops() -> UssdReply {
    unavailable("Hakuna mazao yanayopatikana kwa sasa.")
}

pub fn no_pickup_locations() -> UssdReply {
    unavailable("Hakuna maeneo ya kuchukua mizigo kwa sasa.")
}

pub fn no_destinations() -> UssdReply {
    unavailable("Hakuna maeneo ya kupeleka mizigo kwa sasa.")
}

fn unavailable(reason: &str) -> UssdReply {
    Screen::new()
        .line("SAMAHANI")
        .section([reason, "Tafadhali jaribu tena baadae."])
        .line(THANKS)
        .end()
}

pub fn same_location() -> UssdReply {
    Screen::new()
        .line("MAKOSA - MAHALI NI SAWA")
        .section([
            "Mahali pa kuchukua na pa uwasilishaji haviwezi kuwa sawa.",
            "Tafadhali chagua maeneo tofauti.",
        ])
        .line(THANKS)
        .end()
}

pub fn confirmation(c: &Confirmation) -> UssdReply {
    Screen::new()
        .line("UTHIBITISHO - OMBI LIMEPOKELEWA!")
        .section([
            format!("Zao: {}", c.crop),
            format!("Kiasi: {} Magunia", c.quantity),
            format!("Kutoka: {}", c.pickup),
            format!("Kwenda: {}", c.destination),
            format!("Namba ya Ufuatiliaji: {}", c.tracking_number),
        ])
        .section([
            format!("Msafirishaji: {}", c.transporter_name),
            format!("Mawasiliano: {}", c.transporter_phone),
            "Msafirishaji atawasiliana nawe kwa maelezo ya bei na muda.".to_string(),
            "Utapokea ujumbe wa uthibitisho.".to_string(),
            THANKS.to_string(),
        ])
        .end()
}

/// Session had reached a depth whose earlier choices no longer resolve.
pub fn restart_required() -> UssdReply {
    Screen::new()
        .line("SAMAHANI, KUNA HITILAFU YA MFUMO")
        .section([
            "Taarifa zimebadilika wakati wa ombi lako.",
            "Tafadhali anza upya.",
        ])
        .end()
}

/// Catch-all for store and internal failures.
pub fn service_failure() -> UssdReply {
    UssdReply::End("Samahani, kuna tatizo la kimfumo. Tafadhali jaribu baadae.".to_string())
}

// ── Tracking ──────────────────────────────────────────────────

/// Everything the status screen prints, already resolved to display text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderStatusView {
    pub tracking_number: String,
    pub crop: String,
    pub quantity: i32,
    pub pickup: String,
    pub destination: String,
    pub status: String,
    pub transporter_name: String,
    pub transporter_phone: String,
}

pub fn tracking_prompt() -> UssdReply {
    Screen::new()
        .line("FUATILIA OMBI LAKO")
        .section(["Weka namba ya ufuatiliaji:", TRACKING_EXAMPLE])
        .footer(FOOTER_BACK)
        .proceed()
}

pub fn tracking_retry() -> UssdReply {
    Screen::new()
        .banner(Some(INVALID_TRACKING_BANNER))
        .section([
            "Namba ya ufuatiliaji si sahihi.",
            "Tafadhali weka namba sahihi",
            TRACKING_EXAMPLE,
        ])
        .footer(FOOTER_BACK)
        .proceed()
}

pub fn order_not_found() -> UssdReply {
    Screen::new()
        .line("NAMBA HAIJAPATIKANA")
        .section([
            "Namba ya ufuatiliaji haipo kwenye mfumo wetu.",
            "Tafadhali hakikisha umeweka namba sahihi.",
        ])
        .line("Asante!")
        .end()
}

pub fn order_status(view: &OrderStatusView) -> UssdReply {
    Screen::new()
        .line(format!("HALI YA OMBI: {}", view.tracking_number))
        .section([
            format!("Zao: {}", view.crop),
            format!("Kiasi: {} Magunia", view.quantity),
            format!("Kutoka: {}", view.pickup),
            format!("Kwenda: {}", view.destination),
            format!("Hali: {}", view.status),
        ])
        .section([
            "MAELEZO YA MSAFIRISHAJI:".to_string(),
            format!("Msafirishaji: {}", view.transporter_name),
            format!("Mawasiliano: {}", view.transporter_phone),
        ])
        .line("Kwa maelezo zaidi wasiliana na Msafirishaji.")
        .end()
}
