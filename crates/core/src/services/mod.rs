//! Business logic services.

#![allow(missing_docs)]

pub mod category;
pub mod comment;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod mail;
pub mod notification;
pub mod rating;
pub mod section;
pub mod token;
pub mod user;
pub mod validation;

pub use category::{CategoryService, CreateCategoryInput, UpdateCategoryInput};
pub use comment::{CommentService, CommentWithUser, CreateCommentInput, UpdateCommentInput};
pub use course::{CourseService, CreateCourseInput, UpdateCourseInput};
pub use enrollment::{
    CreateEnrollmentInput, EnrollmentService, EnrollmentWithUser, UpdateEnrollmentInput,
};
pub use lesson::{CreateLessonInput, LessonService, UpdateLessonInput};
pub use mail::{LogMailer, MailMessage, Mailer, SmtpMailer, mailer_from_config};
pub use notification::CourseNotifier;
pub use rating::{CreateRatingInput, RatingService, RatingWithUser, UpdateRatingInput};
pub use section::{CreateSectionInput, SectionService, UpdateSectionInput};
pub use token::{Claims, TokenPair, TokenService, TokenType};
pub use user::{RegisterInput, UserService};
