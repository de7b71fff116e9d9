use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "watchlist")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub overview: Option<String>,
    #[sea_orm(column_name = "posterPath")]
    pub poster_path: Option<String>,
    #[sea_orm(column_name = "voteAverage")]
    pub vote_average: f64,
    #[sea_orm(column_name = "releaseDate")]
    pub release_date: Option<String>,
    #[sea_orm(column_name = "addedDate")]
    pub added_date: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
