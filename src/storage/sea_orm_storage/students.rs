//! 学生存储操作

use super::SeaOrmStorage;
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::students::{entities::Student, requests::NewStudent};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

impl SeaOrmStorage {
    /// 创建学生
    pub async fn create_student_impl(&self, student: NewStudent) -> Result<Student> {
        let model = ActiveModel {
            name: Set(student.name),
            photo_path: Set(student.photo_path),
            original_filename: Set(student.original_filename),
            classroom_id: Set(student.classroom_id),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建学生失败: {e}")))?;

        Ok(result.into_student())
    }

    /// 通过 ID 获取学生
    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 列出学生，可按教室筛选
    pub async fn list_students_impl(&self, classroom_id: Option<i64>) -> Result<Vec<Student>> {
        let mut select = Students::find();

        if let Some(classroom_id) = classroom_id {
            select = select.filter(Column::ClassroomId.eq(classroom_id));
        }

        let students = select
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    /// 删除学生
    pub async fn delete_student_impl(&self, id: i64) -> Result<bool> {
        let result = Students::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除学生失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::students::requests::NewStudent;
    use crate::storage::Storage;
    use crate::test_support::test_storage;

    #[tokio::test]
    async fn test_create_and_delete_student() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;

        let student = storage
            .create_student(NewStudent {
                name: "Alice".into(),
                photo_path: "1-abc.png".into(),
                original_filename: "alice.png".into(),
                classroom_id: None,
            })
            .await
            .unwrap();
        assert_eq!(student.name, "Alice");
        assert_eq!(student.original_filename, "alice.png");

        assert!(storage.delete_student(student.id).await.unwrap());
        assert!(!storage.delete_student(student.id).await.unwrap());
        assert!(storage.list_students(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_students_is_stable_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        let math = storage.create_classroom("Math101".into()).await.unwrap();

        for (name, classroom_id) in [("Alice", Some(math.id)), ("Zed", None), ("Bob", Some(math.id))] {
            storage
                .create_student(NewStudent {
                    name: name.into(),
                    photo_path: format!("{}.png", name.to_lowercase()),
                    original_filename: format!("{name}.png"),
                    classroom_id,
                })
                .await
                .unwrap();
        }

        let summary = |students: Vec<crate::models::students::entities::Student>| {
            students
                .into_iter()
                .map(|s| (s.id, s.name, s.classroom_id))
                .collect::<Vec<_>>()
        };

        let first = summary(storage.list_students(None).await.unwrap());
        let second = summary(storage.list_students(None).await.unwrap());
        assert_eq!(first, second);
        let names: Vec<&str> = first.iter().map(|(_, n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Zed", "Bob"]);

        let in_math = summary(storage.list_students(Some(math.id)).await.unwrap());
        assert_eq!(in_math, summary(storage.list_students(Some(math.id)).await.unwrap()));
        assert_eq!(in_math.len(), 2);
        assert!(in_math.iter().all(|(_, _, c)| *c == Some(math.id)));
    }

    #[tokio::test]
    async fn test_unknown_classroom_is_rejected_by_foreign_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;

        let result = storage
            .create_student(NewStudent {
                name: "Ghost".into(),
                photo_path: "ghost.png".into(),
                original_filename: "ghost.png".into(),
                classroom_id: Some(999),
            })
            .await;
        assert!(result.is_err());
    }
}
