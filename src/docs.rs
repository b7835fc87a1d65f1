use eduzas_auth::Role;
use eduzas_core::{PaginationMeta, PaginationParams, SearchType, StringQuery};
use eduzas_models::answers::{Answer, AnswerCriteria, CreateAnswerDto, UpdateAnswerDto};
use eduzas_models::auth::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, RegisterRequest,
    ResetPasswordRequest,
};
use eduzas_models::classes::{
    AddProfessorDto, Class, ClassCriteria, ClassProfessor, CreateClassDto, EnrollStudentDto,
    Enrollment, SetHiddenDto, UpdateClassDto,
};
use eduzas_models::contacts::{
    AddContactTagDto, Contact, ContactCriteria, CreateContactDto, UpdateContactDto,
};
use eduzas_models::notifications::{
    CreateNotificationDto, MarkReadDto, Notification, NotificationCreated, NotificationCriteria,
    UserNotification,
};
use eduzas_models::resources::{
    AssignResourceDto, ClassResource, CreateResourceDto, Resource, ResourceCriteria,
    ResourceInClass, SetHiddenResourceDto, UpdateResourceDto,
};
use eduzas_models::tags::{CreateTagDto, Tag, TagCriteria};
use eduzas_models::tests::{
    AssignTestDto, ClassTest, CreateTestDto, SetVisibilityDto, Test, TestCriteria, TestInClass,
    UpdateTestDto,
};
use eduzas_models::users::{
    ChangePasswordDto, CreateUserDto, UpdateProfileDto, UpdateUserDto, User, UserCriteria,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::modules::auth::controller::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::auth::controller::register_user,
        crate::modules::auth::controller::login_user,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::users::controller::get_me,
        crate::modules::users::controller::update_me,
        crate::modules::users::controller::change_password,
        crate::modules::users::controller::create_user,
        crate::modules::users::controller::search_users,
        crate::modules::users::controller::get_user,
        crate::modules::users::controller::update_user,
        crate::modules::users::controller::delete_user,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::search_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::enroll_student,
        crate::modules::classes::controller::unenroll_student,
        crate::modules::classes::controller::set_hidden,
        crate::modules::classes::controller::list_students,
        crate::modules::classes::controller::add_professor,
        crate::modules::classes::controller::remove_professor,
        crate::modules::classes::controller::list_professors,
        crate::modules::tags::controller::create_tag,
        crate::modules::tags::controller::search_tags,
        crate::modules::tags::controller::delete_tag,
        crate::modules::contacts::controller::create_contact,
        crate::modules::contacts::controller::search_contacts,
        crate::modules::contacts::controller::get_contact,
        crate::modules::contacts::controller::update_contact,
        crate::modules::contacts::controller::delete_contact,
        crate::modules::contacts::controller::add_contact_tag,
        crate::modules::contacts::controller::remove_contact_tag,
        crate::modules::notifications::controller::create_notification,
        crate::modules::notifications::controller::search_notifications,
        crate::modules::notifications::controller::mark_read,
        crate::modules::notifications::controller::delete_notification,
        crate::modules::tests::controller::create_test,
        crate::modules::tests::controller::search_tests,
        crate::modules::tests::controller::get_test,
        crate::modules::tests::controller::update_test,
        crate::modules::tests::controller::delete_test,
        crate::modules::tests::controller::assign_test,
        crate::modules::tests::controller::set_test_visibility,
        crate::modules::tests::controller::remove_test_from_class,
        crate::modules::tests::controller::list_class_tests,
        crate::modules::answers::controller::create_answer,
        crate::modules::answers::controller::search_answers,
        crate::modules::answers::controller::get_answer,
        crate::modules::answers::controller::update_answer,
        crate::modules::answers::controller::delete_answer,
        crate::modules::resources::controller::create_resource,
        crate::modules::resources::controller::search_resources,
        crate::modules::resources::controller::get_resource,
        crate::modules::resources::controller::update_resource,
        crate::modules::resources::controller::delete_resource,
        crate::modules::resources::controller::attach_resource,
        crate::modules::resources::controller::set_resource_hidden,
        crate::modules::resources::controller::detach_resource,
        crate::modules::resources::controller::list_class_resources,
    ),
    components(
        schemas(
            ErrorResponse,
            Role,
            SearchType,
            StringQuery,
            PaginationMeta,
            PaginationParams,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            MessageResponse,
            User,
            CreateUserDto,
            UpdateProfileDto,
            UpdateUserDto,
            ChangePasswordDto,
            UserCriteria,
            Class,
            CreateClassDto,
            UpdateClassDto,
            ClassCriteria,
            EnrollStudentDto,
            Enrollment,
            SetHiddenDto,
            AddProfessorDto,
            ClassProfessor,
            Tag,
            CreateTagDto,
            TagCriteria,
            Contact,
            CreateContactDto,
            UpdateContactDto,
            AddContactTagDto,
            ContactCriteria,
            Notification,
            NotificationCreated,
            UserNotification,
            CreateNotificationDto,
            NotificationCriteria,
            MarkReadDto,
            Test,
            ClassTest,
            TestInClass,
            CreateTestDto,
            UpdateTestDto,
            TestCriteria,
            AssignTestDto,
            SetVisibilityDto,
            Answer,
            CreateAnswerDto,
            UpdateAnswerDto,
            AnswerCriteria,
            Resource,
            ClassResource,
            ResourceInClass,
            CreateResourceDto,
            UpdateResourceDto,
            ResourceCriteria,
            AssignResourceDto,
            SetHiddenResourceDto,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and password reset"),
        (name = "Users", description = "Profiles and account administration"),
        (name = "Classes", description = "Classes, enrollments and teaching staff"),
        (name = "Tags", description = "Labels for agenda contacts"),
        (name = "Contacts", description = "Personal agenda"),
        (name = "Notifications", description = "Class announcements and inbox"),
        (name = "Tests", description = "Tests and their assignment to classes"),
        (name = "Answers", description = "Student answers to tests"),
        (name = "Resources", description = "Learning resources shared with classes")
    ),
    info(
        title = "EduZas API",
        version = "0.1.0",
        description = "Backend for the EduZas learning platform: classes, tests, answers, resources, notifications and a personal agenda.",
        contact(
            name = "API Support",
            email = "support@eduzas.app"
        ),
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_every_feature() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/users/search",
            "/api/classes/{id}/students",
            "/api/contacts/{user_id}/tags/{tag}",
            "/api/notifications/{id}/read",
            "/api/classes/{id}/tests",
            "/api/answers/{test_id}/{class_id}/{user_id}",
            "/api/classes/{id}/resources",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
