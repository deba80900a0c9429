//! Plain-text rendering of command results on stdout.
#![allow(clippy::print_stdout)]

use emporium_core::{CartItem, CartSummary, DashboardStats, Order, Product, User, format_price};

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        println!(
            "{:<38} {:<32} {:>10} {:>6} in stock",
            product.id,
            product.name,
            format_price(product.price),
            product.stock
        );
    }
}

pub fn product(product: &Product) {
    println!("{}", product.name);
    println!("  id:       {}", product.id);
    println!("  price:    {}", format_price(product.price));
    println!("  stock:    {}", product.stock);
    if let Some(category) = &product.category {
        println!("  category: {category}");
    }
    println!("  page:     {}", product.slug());
    if let Some(description) = &product.description {
        println!();
        println!("{description}");
    }
}

pub fn cart(items: &[CartItem]) {
    if items.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for item in items {
        let limit = if item.at_stock_limit() { "  (max)" } else { "" };
        println!(
            "{:<38} {:<32} {:>4} x {:>10} = {:>10}{limit}",
            item.product_id(),
            item.product.name,
            item.quantity,
            format_price(item.product.price),
            format_price(item.line_total()),
        );
    }
}

pub fn summary(summary: &CartSummary) {
    println!("Items:          {}", summary.item_count);
    println!("Subtotal:       {}", format_price(summary.subtotal));
    if summary.free_shipping() {
        println!("Shipping:       Free");
    } else {
        println!("Shipping:       {}", format_price(summary.shipping));
    }
    println!("Estimated tax:  {}", format_price(summary.estimated_tax));
    println!("Total:          {}", format_price(summary.total));
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in orders {
        let customer = order.customer.as_ref().map_or("-", |c| c.email.as_str());
        println!(
            "{:<38} {:<10} {:>3} items {:>10}  {}  {customer}",
            order.id,
            order.status,
            order.item_count(),
            format_price(order.total_amount),
            order.created_at.format("%Y-%m-%d"),
        );
        for item in &order.items {
            println!(
                "    {} x {:<32} {:>10}",
                item.quantity,
                item.name(),
                format_price(item.line_total())
            );
        }
    }
}

pub fn stats(stats: &DashboardStats) {
    println!("Users:    {}", stats.users);
    println!("Orders:   {}", stats.orders);
    println!("Products: {}", stats.products);
    println!("Revenue:  {}", format_price(stats.revenue));
}

pub fn user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("  id:      {}", user.id);
    println!("  role:    {}", user.role);
    if let Some(phone) = &user.phone {
        println!("  phone:   {phone}");
    }
    if let Some(address) = &user.address {
        println!("  address: {address}");
    }
}

pub fn line(text: &str) {
    println!("{text}");
}
