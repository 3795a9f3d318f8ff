mod competitor_tests;
mod scan_route_tests;
