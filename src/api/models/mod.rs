// Wire types of the remote attendance API

pub mod common;
pub mod presence;
pub mod qr;
pub mod seance;
pub mod student;
pub mod user;

pub use common::{ApiEnvelope, MessageBody};
pub use presence::{Etat, PresenceAck, PresenceEntry, PresenceRequest, SeancePresence};
pub use qr::{Plage, QrGenerateRequest};
pub use seance::Seance;
pub use student::Student;
pub use user::{LoginResponse, LoginUser, Profile, Role};
