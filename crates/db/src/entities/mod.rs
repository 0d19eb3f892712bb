//! Database entities.

#![allow(missing_docs)]

pub mod category;
pub mod comment;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod rating;
pub mod refresh_token;
pub mod section;
pub mod user;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use course::Entity as Course;
pub use enrollment::Entity as Enrollment;
pub use lesson::Entity as Lesson;
pub use rating::{Entity as Rating, RatingValue};
pub use refresh_token::Entity as RefreshToken;
pub use section::Entity as Section;
pub use user::Entity as User;
