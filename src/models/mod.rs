pub mod course;
pub mod lecture;
pub mod user;

pub use course::{Course, CourseDetails, Level, NewCourseRequest, UpdateCourseRequest};
pub use lecture::{
    AssignLectureRequest, Lecture, LectureDetails, LectureView, NewLectureRequest,
    UpdateLectureRequest,
};
pub use user::{
    AuthResponse, LoginRequest, RegisterRequest, Role, UpdateProfileRequest, User, UserResponse,
    UserSummary,
};
