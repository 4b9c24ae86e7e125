// src/ingest/providers/mod.rs
pub mod nager;
pub mod ticketmaster;

pub use nager::NagerHolidayProvider;
pub use ticketmaster::TicketmasterProvider;
