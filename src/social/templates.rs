//! Push notification copy shown on the recipient's device

pub const FRIEND_REQUEST_TITLE: &str = "New Friend Request";

pub fn friend_request_body(sender: &str) -> String {
    format!("{} wants to add you to their Circle", sender)
}

pub fn friend_request_accepted_title(recipient: &str) -> String {
    format!("{} accepted your request", recipient)
}

pub fn friend_request_declined_title(recipient: &str) -> String {
    format!("{} declined your request", recipient)
}

pub const FRIEND_REQUEST_ACCEPTED_BODY: &str = "You've been added to each other's Circles";
pub const FRIEND_REQUEST_DECLINED_BODY: &str = "You'll remain outside each other's Circles";

pub fn access_request_title(sender: &str) -> String {
    format!("New card request from {}", sender)
}

pub fn access_request_body(sender: &str, card_name: &str) -> String {
    format!("{} wants to use {} you own for a purchase", sender, card_name)
}

pub fn access_request_accepted_title(recipient: &str) -> String {
    format!("{} accepted your card access request", recipient)
}

pub fn access_request_declined_title(recipient: &str) -> String {
    format!("{} declined your card access request", recipient)
}

pub fn access_request_fulfilled_title(recipient: &str) -> String {
    format!("{} completed your card purchase", recipient)
}

pub fn access_request_cancelled_title(sender: &str) -> String {
    format!("{} cancelled their card request", sender)
}

pub fn access_request_confirmed_title(sender: &str, valid: bool) -> String {
    if valid {
        format!("{} confirmed the card purchase", sender)
    } else {
        format!("{} disputed the card purchase", sender)
    }
}

pub const ACCESS_REQUEST_OPEN_BODY: &str = "Click to open the request";

pub fn post_title(creator: &str) -> String {
    format!("New post from {}", creator)
}

pub fn post_body(creator: &str) -> String {
    format!("{} just beamed a new message to their Circle.", creator)
}

pub fn chat_title(sender: &str) -> String {
    format!("New message from {}", sender)
}

pub const CHAT_BODY: &str = "You have new messages in your encrypted chat";
