//! 教室存储操作

use super::SeaOrmStorage;
use crate::entity::classrooms::{ActiveModel, Column, Entity as Classrooms};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::classrooms::entities::Classroom;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建教室
    pub async fn create_classroom_impl(&self, name: String) -> Result<Classroom> {
        let model = ActiveModel {
            name: Set(name),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建教室失败: {e}")))?;

        Ok(result.into_classroom())
    }

    /// 通过 ID 获取教室
    pub async fn get_classroom_by_id_impl(&self, id: i64) -> Result<Option<Classroom>> {
        let result = Classrooms::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教室失败: {e}")))?;

        Ok(result.map(|m| m.into_classroom()))
    }

    /// 按创建顺序列出教室
    pub async fn list_classrooms_impl(&self) -> Result<Vec<Classroom>> {
        let classrooms = Classrooms::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教室列表失败: {e}")))?;

        Ok(classrooms.into_iter().map(|m| m.into_classroom()).collect())
    }

    /// 删除教室，并在同一事务中将其学生的 classroom_id 置空
    pub async fn delete_classroom_impl(&self, id: i64) -> Result<Option<u64>> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("开启事务失败: {e}")))?;

        let existing = Classrooms::find_by_id(id)
            .one(&txn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教室失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let unassigned = Students::update_many()
            .col_expr(StudentColumn::ClassroomId, Expr::value(Option::<i64>::None))
            .filter(StudentColumn::ClassroomId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("移出教室学生失败: {e}")))?
            .rows_affected;

        Classrooms::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除教室失败: {e}")))?;

        txn.commit()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(unassigned))
    }
}

#[cfg(test)]
mod tests {
    use crate::models::students::requests::NewStudent;
    use crate::storage::Storage;
    use crate::test_support::test_storage;

    fn new_student(name: &str, photo: &str, classroom_id: Option<i64>) -> NewStudent {
        NewStudent {
            name: name.to_string(),
            photo_path: photo.to_string(),
            original_filename: format!("{name}.png"),
            classroom_id,
        }
    }

    #[tokio::test]
    async fn test_list_classrooms_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;

        storage.create_classroom("Math101".into()).await.unwrap();
        storage.create_classroom("Art".into()).await.unwrap();

        let first = storage.list_classrooms().await.unwrap();
        let names: Vec<_> = first.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Math101", "Art"]);

        let second = storage.list_classrooms().await.unwrap();
        assert_eq!(
            first.iter().map(|c| c.id).collect::<Vec<_>>(),
            second.iter().map(|c| c.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_delete_classroom_unassigns_students() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;

        let math = storage.create_classroom("Math101".into()).await.unwrap();
        let art = storage.create_classroom("Art".into()).await.unwrap();
        let alice = storage
            .create_student(new_student("Alice", "a.png", Some(math.id)))
            .await
            .unwrap();
        storage
            .create_student(new_student("Bob", "b.png", Some(math.id)))
            .await
            .unwrap();
        storage
            .create_student(new_student("Carol", "c.png", Some(art.id)))
            .await
            .unwrap();

        assert_eq!(storage.delete_classroom(math.id).await.unwrap(), Some(2));
        assert!(storage.get_classroom_by_id(math.id).await.unwrap().is_none());

        let alice = storage.get_student_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(alice.classroom_id, None);
        assert_eq!(storage.list_students(Some(art.id)).await.unwrap().len(), 1);
        assert_eq!(storage.list_students(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_missing_classroom() {
        let dir = tempfile::tempdir().unwrap();
        let storage = test_storage(dir.path()).await;
        assert_eq!(storage.delete_classroom(42).await.unwrap(), None);
    }
}
