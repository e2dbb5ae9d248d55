use sea_orm_migration::prelude::*;

use crate::migrations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(migrations::m202606150001_create_users::Migration),
            Box::new(migrations::m202606150002_create_classrooms::Migration),
            Box::new(migrations::m202606150003_create_exams::Migration),
            Box::new(migrations::m202606150004_create_questions::Migration),
            Box::new(migrations::m202606150005_create_question_responses::Migration),
            Box::new(migrations::m202606150006_create_exam_results::Migration),
            Box::new(migrations::m202606150007_create_materials::Migration),
            Box::new(migrations::m202606150008_create_answer_scripts::Migration),
        ]
    }
}
