pub mod calendar_service;
pub mod event_state;
pub mod participants;
pub mod presence_service;
pub mod scroller;
