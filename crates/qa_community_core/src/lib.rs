pub mod domain;
pub mod ports;
pub mod query;
pub mod voting;

pub use domain::{
    Answer, CommunityStats, DomainParseError, NewAnswer, NewQuestion, NewUser, Question, Role,
    Tag, TargetType, User, Vote, VoteDirection, VoteOutcome, VoteReceipt, VoteTarget, VotedEntity,
};
pub use ports::{Page, PortError, PortResult, QaStore};
pub use voting::{resolve_vote, VoteResolution};
