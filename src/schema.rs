table! {
    #[sql_name = "User"]
    user (user_id) {
        #[sql_name = "User_ID"]
        user_id -> Integer,
        email -> Text,
    }
}

table! {
    #[sql_name = "UCinfo"]
    uc_info (user_id) {
        #[sql_name = "uc_CourseInfo"]
        course_info -> Nullable<Text>,
        #[sql_name = "uc_Name"]
        name -> Nullable<Text>,
        #[sql_name = "uc_Term"]
        term -> Nullable<Text>,
        #[sql_name = "User_ID"]
        user_id -> Integer,
    }
}

table! {
    #[sql_name = "PostBoard"]
    postboard (postboard_id) {
        #[sql_name = "Postboard_ID"]
        postboard_id -> Integer,
        #[sql_name = "Postboard_TimeStamp"]
        postboard_time_stamp -> Timestamp,
        #[sql_name = "Hidden_Post"]
        hidden_post -> Integer,
    }
}

table! {
    #[sql_name = "Post"]
    post (post_id) {
        #[sql_name = "Post_ID"]
        post_id -> Integer,
        #[sql_name = "Post_TimeStamp"]
        post_time_stamp -> Timestamp,
        #[sql_name = "Post_type"]
        post_type -> Text,
    }
}

table! {
    #[sql_name = "UniquePostboardPost"]
    postboard_post (post_id) {
        #[sql_name = "Postboard_ID"]
        postboard_id -> Integer,
        #[sql_name = "Post_ID"]
        post_id -> Integer,
    }
}

table! {
    #[sql_name = "Event"]
    event (event_id) {
        #[sql_name = "Event_ID"]
        event_id -> Integer,
        #[sql_name = "Event_name"]
        event_name -> Text,
        #[sql_name = "Event_Location"]
        event_location -> Text,
        #[sql_name = "Event_attendence"]
        event_attendence -> Integer,
        #[sql_name = "Event_time"]
        event_time -> Timestamp,
        #[sql_name = "Event_type"]
        event_type -> Text,
        #[sql_name = "Post_ID"]
        post_id -> Integer,
    }
}

joinable!(event -> post (post_id));
joinable!(postboard_post -> post (post_id));
joinable!(uc_info -> user (user_id));

allow_tables_to_appear_in_same_query!(
    event,
    post,
    postboard,
    postboard_post,
    uc_info,
    user,
);
