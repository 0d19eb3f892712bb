//! Create category, course, section and lesson tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Category::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Category::Name).string_len(100).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Course::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Course::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Course::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Course::Description).text().not_null())
                    .col(ColumnDef::new(Course::CategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Course::InstructorId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Course::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Course::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_category")
                            .from(Course::Table, Course::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_course_instructor")
                            .from(Course::Table, Course::InstructorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: category_id (for filtering courses by category)
        manager
            .create_index(
                Index::create()
                    .name("idx_course_category_id")
                    .table(Course::Table)
                    .col(Course::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Index: title (for ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_course_title")
                    .table(Course::Table)
                    .col(Course::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Section::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Section::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Section::CourseId).string_len(32).not_null())
                    .col(ColumnDef::new(Section::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Section::DisplayOrder).integer().not_null().default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_section_course")
                            .from(Section::Table, Section::CourseId)
                            .to(Course::Table, Course::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: course_id (for filtering sections by course)
        manager
            .create_index(
                Index::create()
                    .name("idx_section_course_id")
                    .table(Section::Table)
                    .col(Section::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lesson::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Lesson::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Lesson::SectionId).string_len(32).not_null())
                    .col(ColumnDef::new(Lesson::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Lesson::Content).text().not_null())
                    .col(ColumnDef::new(Lesson::DisplayOrder).integer().not_null().default(0))
                    .col(ColumnDef::new(Lesson::Video).string_len(512))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lesson_section")
                            .from(Lesson::Table, Lesson::SectionId)
                            .to(Section::Table, Section::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: section_id (for filtering lessons by section)
        manager
            .create_index(
                Index::create()
                    .name("idx_lesson_section_id")
                    .table(Lesson::Table)
                    .col(Lesson::SectionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Lesson::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Section::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Course::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Course {
    Table,
    Id,
    Title,
    Description,
    CategoryId,
    InstructorId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Section {
    Table,
    Id,
    CourseId,
    Title,
    DisplayOrder,
}

#[derive(Iden)]
enum Lesson {
    Table,
    Id,
    SectionId,
    Title,
    Content,
    DisplayOrder,
    Video,
}
